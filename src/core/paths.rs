//! On-disk locations for the registry, snapshots, and backups.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

/// File name of the profile registry, stored in the user's home directory.
pub const REGISTRY_FILE: &str = "eve-launch-manager.json";

/// Directory under the platform config dir holding the launcher's settings.
pub const SETTINGS_DIR: &str = "EVE Online";

/// The live settings file the launcher reads and writes.
pub const LIVE_SETTINGS_FILE: &str = "state.json";

/// Executable name checked by the presence monitor.
pub const LAUNCHER_EXECUTABLE: &str = "eve-online.exe";

/// Name of the profile created on first run.
pub const DEFAULT_PROFILE: &str = "main";

/// All computed paths used by the manager.
#[derive(Debug, Clone)]
pub struct Paths {
    /// `~/eve-launch-manager.json`
    pub registry_file: PathBuf,
    /// `AppData/Roaming/EVE Online` (or the platform equivalent)
    pub settings_dir: PathBuf,
    /// Where backup archives are written (the home directory)
    pub backup_dir: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine the home directory")?;
        let config = dirs::config_dir().context("could not determine the config directory")?;
        Ok(Self {
            registry_file: home.join(REGISTRY_FILE),
            settings_dir: config.join(SETTINGS_DIR),
            backup_dir: home,
        })
    }

    /// Every location under one root. Used by tests and portable installs.
    pub fn rooted(root: &Path) -> Self {
        Self {
            registry_file: root.join(REGISTRY_FILE),
            settings_dir: root.join(SETTINGS_DIR),
            backup_dir: root.to_path_buf(),
        }
    }

    pub fn live_settings_file(&self) -> PathBuf {
        self.settings_dir.join(LIVE_SETTINGS_FILE)
    }

    pub fn snapshot_file(&self, profile: &str) -> PathBuf {
        self.settings_dir.join(format!("state-{profile}.json"))
    }

    /// Destination for a new backup archive. Second-resolution local
    /// timestamp keeps the name unique per invocation.
    pub fn backup_file(&self) -> PathBuf {
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        self.backup_dir
            .join(format!("eve-settings-backup-{stamp}.zip"))
    }
}
