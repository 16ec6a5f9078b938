//! presence-light: presence indicator core
//!
//! Drives a network-connected status light: signs in with the OAuth2
//! device-code flow, keeps the bearer token fresh, polls a presence endpoint
//! and reports a normalized [`status::Status`] to whatever renders it.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use presence_light::prelude::*;
//!
//! # async fn example() -> presence_light::error::Result<()> {
//! let config = PresenceConfig::load(None)?;
//! let mut machine = PresenceMachine::new(
//!     config.clone(),
//!     Arc::new(ReqwestTransport::with_timeout(config.request_timeout())?),
//!     Arc::new(FileTokenStore::new(config.token_path())),
//!     Arc::new(TracingDisplay::new(config.led_count)),
//! );
//! machine.push_event(Event::ConnectivityEstablished);
//! machine.tick(0).await;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod machine;
pub mod prelude;
pub mod presence;
pub mod status;
pub mod transport;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
