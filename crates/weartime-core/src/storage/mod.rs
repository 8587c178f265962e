pub mod config;
pub mod file;
pub mod kv;
pub mod memory;
pub mod records;

pub use config::ConfigStorage;
pub use file::FileStore;
pub use kv::KeyValueStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

/// Persisted key names. These are shared with existing installs and must not
/// change.
pub mod keys {
    pub const IS_RUNNING: &str = "stopwatch_isRunning";
    pub const CURRENT_START_TIME: &str = "stopwatch_currentStartTime";
    pub const ACCUMULATED_TIME: &str = "stopwatch_accumulatedTime";
    pub const LAST_SAVED_DATE: &str = "stopwatch_todaysDate";
    pub const ALL_RECORDS: &str = "stopwatch_allRecords";

    pub const ALL: [&str; 5] = [
        IS_RUNNING,
        CURRENT_START_TIME,
        ACCUMULATED_TIME,
        LAST_SAVED_DATE,
        ALL_RECORDS,
    ];
}

pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("weartime")
}

pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("weartime")
}

pub fn init_data_dir(data_dir: Option<PathBuf>) -> crate::Result<PathBuf> {
    let data_dir = data_dir.unwrap_or_else(get_data_dir);
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir)
}

pub fn init_config_dir(config_dir: Option<PathBuf>) -> crate::Result<PathBuf> {
    let config_dir = config_dir.unwrap_or_else(get_config_dir);
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}
