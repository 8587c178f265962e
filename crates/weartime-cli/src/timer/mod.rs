pub mod controller;
pub mod events;
pub mod ticker;

pub use controller::{ControllerError, TimerController, TimerSnapshot, Toggled};
pub use events::{TimerEvent, TimerEventType};
pub use ticker::Ticker;
