//! Timer state store: start/stop/reset, persistence and crash recovery.
//!
//! The store is the only owner of the stopwatch scalars and the session log.
//! Every mutation is written through to the [`KeyValueStore`] immediately;
//! a failed write is logged and remembered as a warning while the in-memory
//! state stays authoritative for the rest of the process.
//!
//! ## Reconciliation on load
//!
//! ```text
//! saved date != today      -> NewDay    (counter = 0, running session dropped)
//! running, elapsed > stale -> Abandoned (counter kept, session dropped)
//! running                  -> Resumed
//! otherwise                -> Stopped
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::clock::{Clock, SystemClock};
use crate::models::{Config, Reconciliation, SessionRecord, Status, TimerState};
use crate::storage::{KeyValueStore, keys, records};
use crate::{Error, Result};

/// Upper bound for a stored daily counter; anything larger is corrupt
const MAX_ACCUMULATED_MS: u64 = 48 * 60 * 60 * 1000;

/// Thresholds the store applies
#[derive(Debug, Clone, PartialEq)]
pub struct StorePolicy {
    pub stale_after: Duration,
    pub long_session: Duration,
    pub max_records: Option<usize>,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for StorePolicy {
    fn from(config: &Config) -> Self {
        Self {
            stale_after: config.timer.stale_after(),
            long_session: config.timer.long_session(),
            max_records: config.retention.max_records,
        }
    }
}

pub struct TimerStateStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    policy: StorePolicy,
    state: TimerState,
    records: Vec<SessionRecord>,
    status: Status,
    warning: Option<String>,
    /// The in-memory log holds records the last write failed to persist
    log_unsaved: bool,
}

impl<S: KeyValueStore> TimerStateStore<S, SystemClock> {
    pub fn new(storage: S, policy: StorePolicy) -> Self {
        Self::with_clock(storage, SystemClock, policy)
    }
}

impl<S: KeyValueStore, C: Clock> TimerStateStore<S, C> {
    /// Create a store with an explicit clock. State is not read until
    /// [`load_and_reconcile`](Self::load_and_reconcile) runs.
    pub fn with_clock(storage: S, clock: C, policy: StorePolicy) -> Self {
        let today = clock.today();
        Self {
            storage,
            clock,
            policy,
            state: TimerState::new(today),
            records: Vec::new(),
            status: Status::Ready,
            warning: None,
            log_unsaved: false,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Last persistence problem, if any write has failed
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn policy(&self) -> &StorePolicy {
        &self.policy
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Accumulated time plus the running session, without mutating anything
    pub fn current_total(&self) -> u64 {
        self.state.total_ms(self.clock.now())
    }

    /// Elapsed time of the running session, zero when stopped
    pub fn current_session_ms(&self) -> u64 {
        self.state.running_ms(self.clock.now())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.state.is_running {
            return Err(Error::AlreadyRunning);
        }

        let now = self.clock.now();
        let today = self.clock.local_date(now);
        if today != self.state.last_saved_date {
            tracing::info!(
                "New day detected ({} -> {}), resetting daily accumulated time",
                self.state.last_saved_date,
                today
            );
            self.state.accumulated_ms = 0;
            self.state.last_saved_date = today;
        }

        self.state.begin(now);
        // Persist before anything is shown so a crash right after start is
        // still recoverable
        self.persist_scalars();
        self.status = Status::Running;

        tracing::info!("Stopwatch started at {}", now.to_rfc3339());
        Ok(())
    }

    /// Stop the running session, add it to today's total and append it to
    /// the log
    pub fn stop(&mut self) -> Result<SessionRecord> {
        let Some(start) = self.state.current_start_time.filter(|_| self.state.is_running) else {
            return Err(Error::NotRunning);
        };

        let now = self.clock.now();
        let record = SessionRecord::completed(start, now, self.policy.long_session, &self.clock);
        let today = self.clock.local_date(now);

        if today == self.state.last_saved_date && !record.crosses_midnight {
            self.state.accumulated_ms = self.state.accumulated_ms.saturating_add(record.session_duration);
        } else {
            // The day rolled over while running: only the share since the
            // latest local midnight counts toward the new day
            let todays_share = record.overlap_ms(today, &self.clock);
            tracing::info!(
                "Session crossed midnight, crediting {} of {} ms to {}",
                todays_share,
                record.session_duration,
                today
            );
            self.state.accumulated_ms = todays_share;
            self.state.last_saved_date = today;
        }
        self.state.clear_running();

        let mut log = self.read_log_for_append();
        log.push(record.clone());
        let dropped = records::apply_retention(&mut log, self.policy.max_records);
        if dropped > 0 {
            tracing::info!("Retention dropped {} oldest session records", dropped);
        }
        self.records = log;

        self.persist_all();
        self.status = Status::idle(self.state.accumulated_ms);

        tracing::info!(
            "Stopwatch stopped - Session: {}, Total today: {}",
            record.duration_formatted(),
            crate::format::format_duration(self.state.accumulated_ms)
        );
        Ok(record)
    }

    /// Zero today's counter and clear the running state. The session log is
    /// kept.
    pub fn reset(&mut self) {
        self.state.clear_running();
        self.state.accumulated_ms = 0;
        self.state.last_saved_date = self.clock.today();

        self.persist_scalars();
        self.status = Status::Reset;
        tracing::info!("Stopwatch reset");
    }

    /// Remove every persisted key, including the session log
    pub fn clear_all(&mut self) {
        for key in keys::ALL {
            if let Err(e) = self.storage.remove(key) {
                self.record_warning(format!("Could not clear '{}': {}", key, e));
            }
        }

        self.state = TimerState::new(self.clock.today());
        self.records.clear();
        self.log_unsaved = false;
        self.status = Status::Ready;
        tracing::warn!("All stored timer data cleared");
    }

    /// Write the current scalars if a session is running. Used by the
    /// visibility and shutdown hooks; returns whether anything was written
    /// successfully.
    pub fn flush_if_running(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }
        self.persist_scalars()
    }

    /// Restore persisted state and reconcile it against the clock. Safe to
    /// call repeatedly: a second call with no mutation in between yields the
    /// same state.
    pub fn load_and_reconcile(&mut self) -> Reconciliation {
        let now = self.clock.now();
        let today = self.clock.local_date(now);

        self.records = records::decode(self.storage.get(keys::ALL_RECORDS).as_deref()).into_records();
        self.log_unsaved = false;

        let saved_date = self
            .storage
            .get(keys::LAST_SAVED_DATE)
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());
        let saved_start = self.read_running_start();

        if saved_date != Some(today) {
            tracing::info!(
                "New day detected (saved {:?}, today {}), resetting daily accumulated time",
                saved_date,
                today
            );

            let discarded = saved_start.map(|start| self.log_interrupted(start, now));

            self.state = TimerState::new(today);
            self.persist_all();
            self.status = if saved_date.is_some() {
                Status::NewDay
            } else {
                Status::Ready
            };

            return Reconciliation::NewDay {
                previous_date: saved_date,
                discarded,
            };
        }

        let accumulated_ms = self.read_accumulated();
        self.state = TimerState::new(today);
        self.state.accumulated_ms = accumulated_ms;

        if let Some(start) = saved_start {
            let elapsed = now - start;

            if elapsed > self.policy.stale_after {
                tracing::warn!(
                    "Crash recovery: timer had been running for {} hours, discarding session",
                    elapsed.num_hours()
                );

                let discarded = self.log_interrupted(start, now);
                self.persist_all();
                self.status = Status::ResetAfterCrash;

                return Reconciliation::Abandoned { discarded };
            }

            tracing::info!("Crash recovery: resuming timer started at {}", start.to_rfc3339());
            self.state.begin(start);
            self.status = Status::Recovered;

            return Reconciliation::Resumed {
                elapsed_ms: elapsed.num_milliseconds().max(0) as u64,
            };
        }

        tracing::debug!("Loaded saved state - timer was stopped");
        self.status = if accumulated_ms > 0 {
            Status::Resumed { accumulated_ms }
        } else {
            Status::Ready
        };

        Reconciliation::Stopped { accumulated_ms }
    }

    fn read_running_start(&self) -> Option<DateTime<Utc>> {
        let running = self
            .storage
            .get(keys::IS_RUNNING)
            .is_some_and(|raw| raw.trim() == "true");
        if !running {
            return None;
        }

        let start = self
            .storage
            .get(keys::CURRENT_START_TIME)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis);

        if start.is_none() {
            tracing::warn!("Saved state says running but has no valid start time, treating as stopped");
        }
        start
    }

    fn read_accumulated(&self) -> u64 {
        let Some(raw) = self.storage.get(keys::ACCUMULATED_TIME) else {
            return 0;
        };

        // Older writers could store a float or a negative number
        match raw.trim().parse::<f64>() {
            Ok(ms) if ms.is_finite() && ms > 0.0 && ms <= MAX_ACCUMULATED_MS as f64 => ms as u64,
            Ok(ms) if ms > MAX_ACCUMULATED_MS as f64 => {
                tracing::warn!("Saved accumulated time '{}' is out of range, using 0", raw);
                0
            }
            Ok(_) => 0,
            Err(_) => {
                tracing::warn!("Saved accumulated time '{}' is not a number, using 0", raw);
                0
            }
        }
    }

    /// The stored log wins unless memory holds records that were never
    /// saved. A missing or unreadable stored log also falls back to memory.
    fn read_log_for_append(&self) -> Vec<SessionRecord> {
        if self.log_unsaved {
            return self.records.clone();
        }

        match records::decode(self.storage.get(keys::ALL_RECORDS).as_deref()) {
            records::DecodedLog::Records { records, .. } => records,
            records::DecodedLog::Missing | records::DecodedLog::Corrupt => self.records.clone(),
        }
    }

    fn log_interrupted(&mut self, start: DateTime<Utc>, now: DateTime<Utc>) -> SessionRecord {
        let record = SessionRecord::interrupted(start, now, self.policy.long_session, &self.clock);
        self.records.push(record.clone());
        records::apply_retention(&mut self.records, self.policy.max_records);
        record
    }

    fn scalar_entries(&self) -> Vec<(&'static str, String)> {
        let start = self
            .state
            .current_start_time
            .map(|t| t.timestamp_millis().to_string())
            .unwrap_or_default();

        // Running flag last when starting, first when stopping, so a partial
        // sequential write never leaves "running" without a start time
        let mut entries = vec![
            (keys::CURRENT_START_TIME, start),
            (keys::ACCUMULATED_TIME, self.state.accumulated_ms.to_string()),
            (
                keys::LAST_SAVED_DATE,
                self.state.last_saved_date.format("%Y-%m-%d").to_string(),
            ),
        ];
        let flag = (keys::IS_RUNNING, self.state.is_running.to_string());
        if self.state.is_running {
            entries.push(flag);
        } else {
            entries.insert(0, flag);
        }
        entries
    }

    fn persist_scalars(&mut self) -> bool {
        let entries = self.scalar_entries();
        self.write(&entries)
    }

    fn persist_all(&mut self) -> bool {
        let mut entries = self.scalar_entries();
        let mut log_included = false;
        match records::encode(&self.records) {
            Ok(log) => {
                entries.push((keys::ALL_RECORDS, log));
                log_included = true;
            }
            Err(e) => self.record_warning(format!("Could not encode session log: {}", e)),
        }

        let saved = self.write(&entries);
        self.log_unsaved = !(saved && log_included);
        saved
    }

    fn write(&mut self, entries: &[(&'static str, String)]) -> bool {
        match self.storage.set_many(entries) {
            Ok(()) => {
                tracing::debug!("State saved ({} keys)", entries.len());
                true
            }
            Err(e) => {
                self.record_warning(format!(
                    "Could not save timer state, changes will not survive a restart: {}",
                    e
                ));
                false
            }
        }
    }

    fn record_warning(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warning = Some(message);
    }
}
