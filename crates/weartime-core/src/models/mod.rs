pub mod config;
pub mod session;
pub mod state;

pub use config::{Config, RetentionConfig, TimerConfig};
pub use session::SessionRecord;
pub use state::{Reconciliation, Status, TimerState};
