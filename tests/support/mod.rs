#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use presence_light::auth::{AuthError, TokenBundle, TokenStore};
use presence_light::config::PresenceConfig;
use presence_light::machine::PresenceMachine;
use presence_light::status::{Status, StatusDisplay};
use presence_light::transport::{JsonRequest, JsonTransport, TransportError};
use serde_json::{json, Value};

/// Transport that replays queued responses and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<JsonRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Value) {
        self.responses
            .lock()
            .expect("transport lock poisoned")
            .push_back(Ok(response));
    }

    pub fn push_error(&self, error: TransportError) {
        self.responses
            .lock()
            .expect("transport lock poisoned")
            .push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<JsonRequest> {
        self.requests.lock().expect("transport lock poisoned").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("transport lock poisoned").len()
    }

    pub fn last_request(&self) -> Option<JsonRequest> {
        self.requests.lock().expect("transport lock poisoned").last().cloned()
    }
}

#[async_trait]
impl JsonTransport for ScriptedTransport {
    async fn send(&self, request: JsonRequest) -> Result<Value, TransportError> {
        self.requests
            .lock()
            .expect("transport lock poisoned")
            .push(request);
        self.responses
            .lock()
            .expect("transport lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("no scripted response".to_string())))
    }
}

#[derive(Default)]
pub struct InMemoryTokenStore {
    bundle: Mutex<Option<TokenBundle>>,
    saves: Mutex<usize>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(bundle: TokenBundle) -> Self {
        let store = Self::default();
        *store.bundle.lock().expect("store lock poisoned") = Some(bundle);
        store
    }

    pub fn get(&self) -> Option<TokenBundle> {
        self.bundle.lock().expect("store lock poisoned").clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().expect("store lock poisoned")
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<TokenBundle>, AuthError> {
        // Expiry is never persisted.
        Ok(self.get().map(|mut bundle| {
            bundle.expires_at_ms = 0;
            bundle
        }))
    }

    fn save(&self, bundle: &TokenBundle) -> Result<(), AuthError> {
        *self.bundle.lock().expect("store lock poisoned") = Some(bundle.clone());
        *self.saves.lock().expect("store lock poisoned") += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.bundle.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    shown: Mutex<Vec<Status>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<Status> {
        self.shown.lock().expect("display lock poisoned").clone()
    }

    pub fn last(&self) -> Option<Status> {
        self.shown().last().copied()
    }
}

impl StatusDisplay for RecordingDisplay {
    fn show(&self, status: Status) {
        self.shown.lock().expect("display lock poisoned").push(status);
    }
}

pub fn config() -> PresenceConfig {
    PresenceConfig {
        tenant: "contoso.onmicrosoft.com".to_string(),
        ..PresenceConfig::default()
    }
}

pub struct Harness {
    pub machine: PresenceMachine,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<InMemoryTokenStore>,
    pub display: Arc<RecordingDisplay>,
}

pub fn harness(config: PresenceConfig, store: InMemoryTokenStore) -> Harness {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(store);
    let display = Arc::new(RecordingDisplay::new());
    let machine = PresenceMachine::new(config, transport.clone(), store.clone(), display.clone());
    Harness {
        machine,
        transport,
        store,
        display,
    }
}

pub fn device_code_response() -> Value {
    json!({
        "device_code": "D1",
        "user_code": "U1",
        "interval": 5,
        "verification_uri": "https://x",
        "message": "m"
    })
}

pub fn grant_response(expires_in: u64) -> Value {
    json!({
        "access_token": "A",
        "refresh_token": "R",
        "id_token": "I",
        "expires_in": expires_in
    })
}

pub fn pending_response() -> Value {
    json!({
        "error": "authorization_pending",
        "error_description": "AADSTS70016: pending"
    })
}

pub fn presence_response(availability: &str, activity: &str) -> Value {
    json!({ "availability": availability, "activity": activity })
}

pub fn session() -> TokenBundle {
    TokenBundle::new("stored-access", "stored-refresh", "stored-id", 0)
}
