use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::SessionRecord;
use crate::format::format_duration;

/// Persisted stopwatch scalars.
///
/// `current_start_time` is present exactly when `is_running` is set; use
/// [`TimerState::begin`] and [`TimerState::clear_running`] rather than
/// assigning the fields separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_running: bool,
    pub current_start_time: Option<DateTime<Utc>>,
    /// Completed-session milliseconds for `last_saved_date`
    pub accumulated_ms: u64,
    pub last_saved_date: NaiveDate,
}

impl TimerState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            is_running: false,
            current_start_time: None,
            accumulated_ms: 0,
            last_saved_date: today,
        }
    }

    pub fn begin(&mut self, at: DateTime<Utc>) {
        self.is_running = true;
        self.current_start_time = Some(at);
    }

    pub fn clear_running(&mut self) {
        self.is_running = false;
        self.current_start_time = None;
    }

    /// Milliseconds of the in-progress session at `now`, zero when stopped
    pub fn running_ms(&self, now: DateTime<Utc>) -> u64 {
        match (self.is_running, self.current_start_time) {
            (true, Some(start)) => (now - start).num_milliseconds().max(0) as u64,
            _ => 0,
        }
    }

    pub fn total_ms(&self, now: DateTime<Utc>) -> u64 {
        self.accumulated_ms.saturating_add(self.running_ms(now))
    }
}

/// What `load_and_reconcile` found and did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reconciliation {
    /// The saved date is not today: the counter restarted at zero. A session
    /// that was running is discarded and logged as interrupted.
    NewDay {
        previous_date: Option<NaiveDate>,
        discarded: Option<SessionRecord>,
    },
    /// A running session was resumed after a restart
    Resumed { elapsed_ms: u64 },
    /// A running session was too old to trust and was dropped
    Abandoned { discarded: SessionRecord },
    /// Nothing was running
    Stopped { accumulated_ms: u64 },
}

/// User-facing status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    Ready,
    Running,
    Stopped { accumulated_ms: u64 },
    Resumed { accumulated_ms: u64 },
    Recovered,
    ResetAfterCrash,
    NewDay,
    Reset,
}

impl Status {
    /// Status for an idle timer with `accumulated_ms` on the counter
    pub fn idle(accumulated_ms: u64) -> Self {
        if accumulated_ms > 0 {
            Status::Stopped { accumulated_ms }
        } else {
            Status::Ready
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => write!(f, "Ready to start"),
            Status::Running => write!(f, "Timer running..."),
            Status::Stopped { accumulated_ms } => {
                write!(f, "Stopped - Total today: {}", format_duration(*accumulated_ms))
            }
            Status::Resumed { accumulated_ms } => write!(
                f,
                "Resumed - {} accumulated today",
                format_duration(*accumulated_ms)
            ),
            Status::Recovered => write!(f, "Recovered from crash - timer was running"),
            Status::ResetAfterCrash => {
                write!(f, "Reset after crash - timer had been running too long")
            }
            Status::NewDay => write!(f, "New day - Ready to start"),
            Status::Reset => write!(f, "Reset - Ready to start"),
        }
    }
}
