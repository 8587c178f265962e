pub mod manager;

pub use manager::{ConfigManager, ConfigManagerError, DATA_DIR_ENV};
