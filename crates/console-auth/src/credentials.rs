//! Credential storage for the console's token pair
//!
//! `CredentialStore` is the interface the HTTP client consumes. Two stores
//! ship with the crate: `FileCredentialStore` persists to a JSON file (atomic
//! temp-file + rename, 0600) so a restarted console keeps its session, and
//! `MemoryCredentialStore` keeps the pair in process only.
//!
//! The interface is synchronous and infallible: the request interceptor reads
//! it on every call. Persistence failures are logged and the in-memory state
//! stays authoritative until the next successful write.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Source of the current access/refresh tokens.
///
/// Empty tokens are reported as absent.
pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Option<Secret<String>>;

    fn refresh_token(&self) -> Option<Secret<String>>;

    /// Replace both tokens (login or successful refresh).
    fn set_tokens(&self, access: &str, refresh: &str);

    /// Forget both tokens (logout or unrecoverable auth failure).
    fn clear_tokens(&self);
}

/// On-disk and in-memory representation of the stored pair.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("has_access", &self.access().is_some())
            .field("has_refresh", &self.refresh().is_some())
            .finish()
    }
}

impl StoredCredentials {
    fn access(&self) -> Option<Secret<String>> {
        non_empty(self.access_token.as_deref())
    }

    fn refresh(&self) -> Option<Secret<String>> {
        non_empty(self.refresh_token.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<Secret<String>> {
    value.filter(|v| !v.is_empty()).map(Secret::from)
}

/// Process-local store. Starts empty unless seeded.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    state: RwLock<StoredCredentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token pair.
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        store.set_tokens(access, refresh);
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<Secret<String>> {
        read(&self.state).access()
    }

    fn refresh_token(&self) -> Option<Secret<String>> {
        read(&self.state).refresh()
    }

    fn set_tokens(&self, access: &str, refresh: &str) {
        let mut state = write(&self.state);
        state.access_token = Some(access.to_owned());
        state.refresh_token = Some(refresh.to_owned());
    }

    fn clear_tokens(&self) {
        *write(&self.state) = StoredCredentials::default();
    }
}

/// JSON-file backed store.
///
/// The RwLock serializes writers; every mutation persists the whole state
/// while the write lock is held so the file never reflects a torn update.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    state: RwLock<StoredCredentials>,
}

impl FileCredentialStore {
    /// Load credentials from `path`.
    ///
    /// A missing file is a cold start: the store begins empty and writes `{}`
    /// so later loads take the normal path.
    pub fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let stored: StoredCredentials = serde_json::from_str(&contents)
                .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?;
            info!(
                path = %path.display(),
                has_access = stored.access().is_some(),
                has_refresh = stored.refresh().is_some(),
                "loaded credentials"
            );
            stored
        } else {
            info!(path = %path.display(), "credential file not found, starting signed out");
            let stored = StoredCredentials::default();
            write_atomic(&path, &stored)?;
            stored
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &StoredCredentials) {
        if let Err(e) = write_atomic(&self.path, state) {
            warn!(path = %self.path.display(), error = %e, "failed to persist credentials");
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Option<Secret<String>> {
        read(&self.state).access()
    }

    fn refresh_token(&self) -> Option<Secret<String>> {
        read(&self.state).refresh()
    }

    fn set_tokens(&self, access: &str, refresh: &str) {
        let mut state = write(&self.state);
        state.access_token = Some(access.to_owned());
        state.refresh_token = Some(refresh.to_owned());
        debug!("stored new token pair");
        self.persist(&state);
    }

    fn clear_tokens(&self) {
        let mut state = write(&self.state);
        *state = StoredCredentials::default();
        debug!("cleared credentials");
        self.persist(&state);
    }
}

fn read(lock: &RwLock<StoredCredentials>) -> std::sync::RwLockReadGuard<'_, StoredCredentials> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write(lock: &RwLock<StoredCredentials>) -> std::sync::RwLockWriteGuard<'_, StoredCredentials> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Write credentials to a file atomically.
///
/// Writes a temp file next to the target and renames it over the target.
/// The file holds live tokens, so it is created 0600 on unix.
fn write_atomic(path: &Path, data: &StoredCredentials) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::CredentialParse(format!("serializing credentials: {e}")))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        Some(_) => Path::new("."),
        None => return Err(Error::Io("credential path has no parent directory".into())),
    };

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}
