//! Vault configuration
//!
//! Non-sensitive settings only: where the store lives and how long writers
//! wait on a busy database. Key material is never part of the config.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, VaultError};

/// Environment variable that overrides the store location
pub const STORE_PATH_ENV: &str = "PASSVAULT_DB";

/// Environment variable that overrides the busy timeout, in milliseconds
pub const BUSY_TIMEOUT_ENV: &str = "PASSVAULT_BUSY_TIMEOUT_MS";

/// File name of the default database
pub const DEFAULT_DB_FILE: &str = "passvault.db";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Vault settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultConfig {
    /// Store location override; `None` means the platform default
    pub store_path: Option<PathBuf>,
    /// How long a write waits for a locked database
    pub busy_timeout_ms: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl VaultConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Defaults plus overrides from `PASSVAULT_DB` and `PASSVAULT_BUSY_TIMEOUT_MS`
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source. Empty values count as unset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(path) = lookup(STORE_PATH_ENV) {
            debug!("Store path overridden by {}", STORE_PATH_ENV);
            self.store_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup(BUSY_TIMEOUT_ENV) {
            self.busy_timeout_ms = raw.trim().parse().map_err(|_| {
                VaultError::InvalidConfiguration(format!(
                    "{} must be a whole number of milliseconds, got {:?}",
                    BUSY_TIMEOUT_ENV, raw
                ))
            })?;
        }

        Ok(self)
    }

    /// Load settings from a JSON file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            VaultError::InvalidConfiguration(format!("cannot read {:?}: {}", path, e))
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            VaultError::InvalidConfiguration(format!("invalid settings in {:?}: {}", path, e))
        })?;

        debug!("Loaded settings from {:?}", path);
        Ok(config)
    }

    /// Save settings to a JSON file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::InvalidConfiguration(e.to_string()))?;

        // Write atomically using temp file
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, path).await?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Where the store lives: the override, else the platform data directory
    pub fn resolve_store_path(&self) -> PathBuf {
        if let Some(path) = &self.store_path {
            return path.clone();
        }

        ProjectDirs::from("com", "passvault", "passvault")
            .map(|dirs| dirs.data_dir().join(DEFAULT_DB_FILE))
            .unwrap_or_else(|| PathBuf::from("data").join(DEFAULT_DB_FILE))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = VaultConfig::default();
        assert!(config.store_path.is_none());
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert!(config.resolve_store_path().ends_with(DEFAULT_DB_FILE));
    }

    #[test]
    fn test_store_path_override() {
        let config = VaultConfig::default()
            .with_overrides(vars(&[(STORE_PATH_ENV, "/tmp/elsewhere/vault.db")]))
            .unwrap();

        assert_eq!(
            config.resolve_store_path(),
            PathBuf::from("/tmp/elsewhere/vault.db")
        );
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let config = VaultConfig::default()
            .with_overrides(vars(&[(STORE_PATH_ENV, "  ")]))
            .unwrap();

        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_busy_timeout_override() {
        let config = VaultConfig::default()
            .with_overrides(vars(&[(BUSY_TIMEOUT_ENV, "250")]))
            .unwrap();
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));

        let bad = VaultConfig::default().with_overrides(vars(&[(BUSY_TIMEOUT_ENV, "soon")]));
        assert!(matches!(bad, Err(VaultError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = VaultConfig::load(&temp_dir.path().join("settings.json")).unwrap();
        assert_eq!(config, VaultConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            VaultConfig::load(&path),
            Err(VaultError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let config = VaultConfig::new().with_store_path(temp_dir.path().join("custom.db"));
        config.save(&path).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("storePath"));

        let loaded = VaultConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
