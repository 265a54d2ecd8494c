//! Durable session document on local disk.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use dochub_core::AppResult;
use dochub_core::config::session::SessionConfig;
use dochub_entity::LoginResponse;

/// Reads and writes the `{token, user_data}` JSON document.
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Location of the session file.
    path: PathBuf,
}

impl SessionStore {
    /// Creates a session store at the configured path.
    pub fn new(config: &SessionConfig) -> Self {
        Self::at(&config.path)
    }

    /// Creates a session store at `path`.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session. A missing file means no session.
    pub async fn load(&self) -> AppResult<Option<LoginResponse>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist a session, creating parent directories as needed.
    pub async fn save(&self, session: &LoginResponse) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, body).await?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Delete the persisted session, if any.
    pub async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session removed");
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
