//! Weartime CLI library
//!
//! Controller, refresh ticker and command rendering, exposed as a library for
//! testing.

pub mod app;
pub mod commands;
pub mod config;
pub mod lifecycle;
pub mod timer;
pub mod watch;

pub use app::{FileController, open_controller};
pub use config::ConfigManager;
pub use lifecycle::Lifecycle;
pub use timer::{ControllerError, TimerController, TimerEvent, TimerEventType, Toggled};
