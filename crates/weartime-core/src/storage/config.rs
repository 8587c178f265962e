//! Configuration storage operations

use crate::{Result, models::Config};
use std::path::PathBuf;

pub struct ConfigStorage {
    config_dir: PathBuf,
}

impl ConfigStorage {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn load(&self) -> Result<Config> {
        let config_path = self.config_dir.join("config.json");

        if !config_path.exists() {
            let config = Config::default();
            self.save(&config)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;

        // Handle empty file case
        if content.trim().is_empty() {
            let config = Config::default();
            self.save(&config)?;
            return Ok(config);
        }

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        std::fs::create_dir_all(&self.config_dir)?;

        let config_path = self.config_dir.join("config.json");
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().to_path_buf());

        let config = storage.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(temp_dir.path().join("config.json").exists());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().to_path_buf());

        let mut config = Config::default();
        config.timer.tick_interval_ms = 250;
        storage.save(&config).unwrap();

        assert_eq!(storage.load().unwrap().timer.tick_interval_ms, 250);
    }

    #[test]
    fn test_empty_file_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("config.json"), "  \n").unwrap();

        let storage = ConfigStorage::new(temp_dir.path().to_path_buf());
        assert_eq!(storage.load().unwrap(), Config::default());
    }
}
