use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::language::Language;
use crate::session::SessionConfig;
use crate::Result;

pub const DEFAULT_USERNAME: &str = "cadet";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub language: Language,
    pub duration_secs: u32,
    /// base url of the MarsSpace API, e.g. `https://api.marsspace.uz/api`
    pub server_url: Option<String>,
    pub username: String,
    /// keep scores on this machine even when a server is configured
    pub offline: bool,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            language: session.language,
            duration_secs: session.duration_secs,
            server_url: None,
            username: DEFAULT_USERNAME.to_string(),
            offline: false,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Session settings, falling back to the default duration if the stored one is unusable
    pub fn session(&self) -> SessionConfig {
        SessionConfig::new(self.language, self.duration_secs)
            .unwrap_or_else(|_| SessionConfig::default().with_language(self.language))
    }

    pub fn set_session(&mut self, session: SessionConfig) {
        self.language = session.language;
        self.duration_secs = session.duration_secs;
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Server to report to, unless running offline
    pub fn remote_server(&self) -> Option<&str> {
        if self.offline {
            return None;
        }
        self.server_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

pub trait ConfigStore: Send {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "marstype") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("marstype_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Config store that never touches the disk
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    saved: std::sync::Mutex<Option<Config>>,
}

impl MemoryConfigStore {
    pub fn last_saved(&self) -> Option<Config> {
        self.saved.lock().ok().and_then(|c| c.clone())
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Config {
        self.last_saved().unwrap_or_default()
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Ok(mut slot) = self.saved.lock() {
            *slot = Some(cfg.clone());
        }
        Ok(())
    }
}
