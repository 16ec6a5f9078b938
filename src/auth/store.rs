use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::AuthError;
use super::token::TokenBundle;

const TOKEN_FIELDS: [&str; 3] = ["access_token", "refresh_token", "id_token"];

/// Storage abstraction for the persisted session.
pub trait TokenStore: Send + Sync {
    /// Restore the session. Missing, empty, malformed or partial records all
    /// yield `Ok(None)`; only I/O failures are errors.
    fn load(&self) -> Result<Option<TokenBundle>, AuthError>;
    /// Persist all three credential strings. A partially written record is
    /// never observable by a later `load`.
    fn save(&self, bundle: &TokenBundle) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed token store holding one JSON record.
///
/// # Example
/// ```no_run
/// use presence_light::auth::{FileTokenStore, TokenBundle, TokenStore};
///
/// let store = FileTokenStore::new_default();
/// store.save(&TokenBundle::new("access", "refresh", "id", 0))?;
/// assert!(store.load()?.is_some());
/// # Ok::<(), presence_light::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn new_default() -> Self {
        Self::new(default_context_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenBundle>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored session");
                return Ok(None);
            }
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        if raw.trim().is_empty() {
            debug!(path = %self.path.display(), "Stored session file empty");
            return Ok(None);
        }
        let document: Value = match serde_json::from_str(&raw) {
            Ok(document) => document,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Stored session unreadable");
                return Ok(None);
            }
        };
        Ok(bundle_from_record(&document))
    }

    fn save(&self, bundle: &TokenBundle) -> Result<(), AuthError> {
        let record = StoredSession {
            access_token: &bundle.access_token,
            refresh_token: &bundle.refresh_token,
            id_token: &bundle.id_token,
        };
        let serialized = serde_json::to_vec_pretty(&record)?;
        write_session_file(&self.path, &serialized)?;
        debug!(path = %self.path.display(), bytes = serialized.len(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

#[derive(Serialize)]
struct StoredSession<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
    id_token: &'a str,
}

/// Build a bundle only when all three fields are non-empty strings.
fn bundle_from_record(document: &Value) -> Option<TokenBundle> {
    let fields: Vec<&str> = TOKEN_FIELDS
        .iter()
        .filter_map(|name| document.get(*name).and_then(Value::as_str))
        .filter(|value| !value.is_empty())
        .collect();
    if fields.len() != TOKEN_FIELDS.len() {
        warn!(
            found = fields.len(),
            expected = TOKEN_FIELDS.len(),
            "Stored session incomplete"
        );
        return None;
    }
    Some(TokenBundle::new(fields[0], fields[1], fields[2], 0))
}

fn default_context_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "presence-light")
        .map(|dirs| dirs.data_dir().join("context.json"))
        .unwrap_or_else(|| PathBuf::from("context.json"))
}

/// Replace the session file through a staging file in the same directory,
/// so readers see either the old record or the new one.
fn write_session_file(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|err| session_io("create the directory for", path, err))?;
    }

    let staging = staging_path(path);
    // A crash can leave a stale staging file with foreign permissions.
    let _ = fs::remove_file(&staging);
    let result = write_staged(&staging, data).and_then(|()| fs::rename(&staging, path));
    if let Err(err) = result {
        let _ = fs::remove_file(&staging);
        return Err(session_io("write", path, err));
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "session".into());
    name.push(format!(".{}.partial", std::process::id()));
    path.with_file_name(name)
}

/// Owner-only on unix.
fn write_staged(staging: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(staging)?;
    file.write_all(data)?;
    file.sync_all()
}

fn session_io(action: &str, path: &Path, err: std::io::Error) -> AuthError {
    AuthError::Io(format!("failed to {action} session file {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileTokenStore) {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("context.json"));
        (dir, store)
    }

    #[test]
    fn round_trip_preserves_all_three_tokens() {
        let (_dir, store) = temp_store();
        let bundle = TokenBundle::new("access", "refresh", "id", 0);
        store.save(&bundle).unwrap();
        assert_eq!(store.load().unwrap(), Some(bundle));
    }

    #[test]
    fn expiry_is_not_persisted() {
        let (_dir, store) = temp_store();
        store
            .save(&TokenBundle::new("access", "refresh", "id", 99_000))
            .unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("expires"));
        assert_eq!(store.load().unwrap().unwrap().expires_at_ms, 0);
    }

    #[test]
    fn missing_file_is_no_session() {
        let (_dir, store) = temp_store();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn empty_file_is_no_session() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "").unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_no_session() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ access_token: ").unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn record_needs_exactly_three_fields() {
        let (_dir, store) = temp_store();
        let cases = [
            (r#"{}"#, false),
            (r#"{"access_token":"a"}"#, false),
            (r#"{"access_token":"a","refresh_token":"r"}"#, false),
            (r#"{"access_token":"a","refresh_token":"r","id_token":""}"#, false),
            (r#"{"access_token":"a","refresh_token":"r","id_token":7}"#, false),
            (r#"{"access_token":"a","refresh_token":"r","id_token":"i"}"#, true),
        ];
        for (record, loadable) in cases {
            fs::write(store.path(), record).unwrap();
            assert_eq!(store.load().unwrap().is_some(), loadable, "record {record}");
        }
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let (dir, store) = temp_store();
        store.save(&TokenBundle::new("a", "r", "i", 0)).unwrap();
        store.save(&TokenBundle::new("a2", "r2", "i2", 0)).unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.load().unwrap().unwrap().access_token, "a2");
    }

    #[cfg(unix)]
    #[test]
    fn saved_record_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store();
        store.save(&TokenBundle::new("a", "r", "i", 0)).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn unwritable_location_names_the_session_file() {
        let (dir, _) = temp_store();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = FileTokenStore::new(blocker.join("context.json"));
        match store.save(&TokenBundle::new("a", "r", "i", 0)) {
            Err(AuthError::Io(message)) => assert!(message.contains("session file")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn clear_removes_record() {
        let (_dir, store) = temp_store();
        store.save(&TokenBundle::new("a", "r", "i", 0)).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }
}
