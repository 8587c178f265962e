//! Core of the weartime tracker: the persistent daily stopwatch state
//! machine, its key-value persistence and the session log.

pub mod clock;
pub mod error;
pub mod export;
pub mod format;
pub mod history;
pub mod models;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use store::{StorePolicy, TimerStateStore};
