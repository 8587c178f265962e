//! Timer events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weartime_core::models::{Reconciliation, SessionRecord};

/// Event emitted by the timer controller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerEvent {
    pub event_type: TimerEventType,
    pub timestamp: DateTime<Utc>,
}

/// Types of timer events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEventType {
    /// Session started
    Started { start_time: DateTime<Utc> },
    /// Session stopped and logged
    Stopped { record: SessionRecord, total_ms: u64 },
    /// Periodic display refresh
    Tick { total_ms: u64, session_ms: u64 },
    /// Immediate refresh requested (view became visible again)
    Refreshed { total_ms: u64, running: bool },
    /// Daily counter reset by the user
    Reset,
    /// Persisted state restored at startup
    Reconciled { outcome: Reconciliation },
    /// A write to storage failed; in-memory state is still current
    PersistFailed { message: String },
}

impl TimerEvent {
    /// Create a new timer event
    pub fn new(event_type: TimerEventType) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
        }
    }

    pub fn started(start_time: DateTime<Utc>) -> Self {
        Self::new(TimerEventType::Started { start_time })
    }

    pub fn stopped(record: SessionRecord, total_ms: u64) -> Self {
        Self::new(TimerEventType::Stopped { record, total_ms })
    }

    pub fn tick(total_ms: u64, session_ms: u64) -> Self {
        Self::new(TimerEventType::Tick {
            total_ms,
            session_ms,
        })
    }

    pub fn persist_failed(message: impl Into<String>) -> Self {
        Self::new(TimerEventType::PersistFailed {
            message: message.into(),
        })
    }
}
