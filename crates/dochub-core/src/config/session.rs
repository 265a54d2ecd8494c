//! Persisted session configuration.

use serde::{Deserialize, Serialize};

/// Where the authenticated session is stored between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path of the JSON session file holding the token and profile.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> String {
    "data/session.json".to_string()
}
