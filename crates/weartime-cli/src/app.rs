//! Wiring between configuration, the on-disk store and the controller

use std::path::Path;

use weartime_core::{
    Result, StorePolicy, TimerStateStore,
    models::Config,
    storage::FileStore,
};

use crate::timer::TimerController;

pub type FileController = TimerController<FileStore>;

/// Open the state file under `data_dir` and build a controller around it.
/// Nothing is read until [`TimerController::init`] runs.
pub fn open_controller(config: &Config, data_dir: &Path) -> Result<FileController> {
    let storage = FileStore::open(data_dir)?;
    tracing::debug!("Using state file {}", storage.path().display());

    let store = TimerStateStore::new(storage, StorePolicy::from(config));
    Ok(TimerController::new(store, config.timer.tick_interval()))
}
