//! Client configuration from the environment.
//!
//! | Variable                 | Default                   |
//! |--------------------------|---------------------------|
//! | `PROJECTPRO_API_URL`     | `http://localhost:8000`   |
//! | `PROJECTPRO_STORAGE_DIR` | platform data directory   |

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    /// Where the session file lives. `None` means the platform default.
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            api_url: get("PROJECTPRO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            storage_dir: get("PROJECTPRO_STORAGE_DIR").map(PathBuf::from),
        }
    }
}
