//! Configuration persistence.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{BotConfig, ConfigError};

/// Save/load collaborator for [`BotConfig`].
///
/// The bot saves on quit and on restart so that channels joined or parted
/// at runtime survive the next start.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<BotConfig, ConfigError>;
    fn save(&self, config: &BotConfig) -> Result<(), ConfigError>;
}

/// A TOML file on disk.
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
}

impl TomlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl ConfigStore for TomlFileStore {
    fn load(&self) -> Result<BotConfig, ConfigError> {
        BotConfig::load(&self.path)
    }

    /// Write through a sibling temporary file and rename it into place, so
    /// a crash mid-write never leaves a truncated config behind.
    fn save(&self, config: &BotConfig) -> Result<(), ConfigError> {
        let content = config.to_toml()?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }
}
