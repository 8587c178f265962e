//! Configuration manager

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use weartime_core::{
    Result as CoreResult,
    models::Config,
    storage::{ConfigStorage, get_data_dir, init_config_dir},
};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "WEARTIME_DATA_DIR";

/// Config manager error
#[derive(Debug, thiserror::Error)]
pub enum ConfigManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] weartime_core::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigManagerError>;

/// Manages application configuration
pub struct ConfigManager {
    storage: ConfigStorage,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    pub fn new(config_dir: Option<PathBuf>) -> CoreResult<Self> {
        let config_dir = init_config_dir(config_dir)?;
        let storage = ConfigStorage::new(config_dir);

        // Load or create default config
        let config = storage.load()?;

        Ok(Self {
            storage,
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub async fn get(&self) -> Config {
        self.config.read().await.clone()
    }

    pub async fn update(&self, config: Config) -> Result<Config> {
        config
            .validate()
            .map_err(|e| ConfigManagerError::Invalid(e.to_string()))?;

        self.storage.save(&config)?;

        {
            let mut current = self.config.write().await;
            *current = config.clone();
        }

        tracing::info!("Configuration updated");
        Ok(config)
    }

    /// Update a single dotted key, e.g. `timer.tick_interval_ms`
    pub async fn set_value(&self, key: &str, value: &str) -> Result<Config> {
        let mut config = self.get().await;
        config
            .set_value(key, value)
            .map_err(|e| ConfigManagerError::Invalid(e.to_string()))?;
        self.update(config).await
    }

    pub async fn reset_to_default(&self) -> Result<Config> {
        let config = Config::default();
        self.update(config).await
    }

    /// Data directory in priority order: command line, environment, config
    /// file, platform default
    pub async fn resolve_data_dir(&self, cli_override: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = cli_override {
            return dir;
        }

        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }

        self.config
            .read()
            .await
            .data_dir
            .clone()
            .unwrap_or_else(get_data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn create_manager(temp_dir: &TempDir) -> ConfigManager {
        ConfigManager::new(Some(temp_dir.path().join("config"))).unwrap()
    }

    #[tokio::test]
    async fn test_get_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_manager(&temp_dir);
        let config = manager.get().await;
        assert_eq!(config.version, "1.0.0");
        assert!(temp_dir.path().join("config/config.json").exists());
    }

    #[tokio::test]
    async fn test_set_value_persists() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_manager(&temp_dir);

        let updated = manager
            .set_value("timer.tick_interval_ms", "500")
            .await
            .unwrap();
        assert_eq!(updated.timer.tick_interval_ms, 500);

        let reopened = create_manager(&temp_dir);
        assert_eq!(reopened.get().await.timer.tick_interval_ms, 500);
    }

    #[tokio::test]
    async fn test_invalid_value_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_manager(&temp_dir);

        let result = manager.set_value("log_level", "loud").await;
        assert!(matches!(result, Err(ConfigManagerError::Invalid(_))));
        assert_eq!(manager.get().await.log_level, "info");
    }

    #[tokio::test]
    async fn test_reset_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_manager(&temp_dir);
        manager.set_value("retention.max_records", "none").await.unwrap();

        let config = manager.reset_to_default().await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    #[serial]
    async fn test_resolve_data_dir_priority() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_manager(&temp_dir);
        manager.set_value("data_dir", "/from/config").await.unwrap();

        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
        assert_eq!(manager.resolve_data_dir(None).await, PathBuf::from("/from/config"));

        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/from/env");
        }
        assert_eq!(manager.resolve_data_dir(None).await, PathBuf::from("/from/env"));
        assert_eq!(
            manager.resolve_data_dir(Some(PathBuf::from("/from/cli"))).await,
            PathBuf::from("/from/cli")
        );

        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_resolve_data_dir_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_manager(&temp_dir);

        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
        assert_eq!(manager.resolve_data_dir(None).await, get_data_dir());
    }
}
