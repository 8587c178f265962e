//! Timer controller - owns the state store, the refresh ticker and the event
//! channel, and maps user and lifecycle actions onto them

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::time::Duration;

use weartime_core::{
    Clock, SystemClock, TimerStateStore,
    models::{Reconciliation, SessionRecord, Status, TimerState},
    storage::KeyValueStore,
};

use super::events::{TimerEvent, TimerEventType};
use super::ticker::Ticker;

/// Timer controller error
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Timer is already running")]
    AlreadyRunning,

    #[error("Timer is not running")]
    NotRunning,

    #[error("Core error: {0}")]
    Core(weartime_core::Error),
}

impl From<weartime_core::Error> for ControllerError {
    fn from(err: weartime_core::Error) -> Self {
        match err {
            weartime_core::Error::AlreadyRunning => ControllerError::AlreadyRunning,
            weartime_core::Error::NotRunning => ControllerError::NotRunning,
            other => ControllerError::Core(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;

/// Result of a start/stop toggle
#[derive(Debug, Clone, PartialEq)]
pub enum Toggled {
    Started(DateTime<Utc>),
    Stopped(SessionRecord),
}

/// Point-in-time view of the timer for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub status: Status,
    pub status_text: String,
    pub total_ms: u64,
    pub session_ms: u64,
    pub warning: Option<String>,
}

pub struct TimerController<S, C = SystemClock> {
    store: Arc<RwLock<TimerStateStore<S, C>>>,
    event_tx: broadcast::Sender<TimerEvent>,
    ticker: Mutex<Ticker>,
    tick_interval: Duration,
}

impl<S, C> TimerController<S, C>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: TimerStateStore<S, C>, tick_interval: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(1000);
        Self {
            store: Arc::new(RwLock::new(store)),
            event_tx,
            ticker: Mutex::new(Ticker::new()),
            tick_interval,
        }
    }

    /// Subscribe to timer events
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    /// Restore persisted state. A resumed session restarts the refresh task.
    pub async fn init(&self) -> Reconciliation {
        let (outcome, running, warning) = {
            let mut store = self.store.write().await;
            let before = store.warning().map(str::to_string);
            let outcome = store.load_and_reconcile();
            (outcome, store.is_running(), new_warning(&store, before))
        };

        tracing::info!("Reconciled persisted state: {:?}", outcome);
        self.emit(TimerEventType::Reconciled {
            outcome: outcome.clone(),
        });
        self.emit_warning(warning);

        if running {
            self.start_ticker().await;
        }

        outcome
    }

    pub async fn start(&self) -> Result<DateTime<Utc>> {
        let (start_time, warning) = {
            let mut store = self.store.write().await;
            let before = store.warning().map(str::to_string);
            store.start()?;
            let start_time = store.state().current_start_time.unwrap_or_else(Utc::now);
            (start_time, new_warning(&store, before))
        };

        self.start_ticker().await;
        let _ = self.event_tx.send(TimerEvent::started(start_time));
        self.emit_warning(warning);

        Ok(start_time)
    }

    pub async fn stop(&self) -> Result<SessionRecord> {
        self.stop_ticker().await;

        let (record, total_ms, warning) = {
            let mut store = self.store.write().await;
            let before = store.warning().map(str::to_string);
            let record = store.stop()?;
            (record, store.current_total(), new_warning(&store, before))
        };

        let _ = self.event_tx.send(TimerEvent::stopped(record.clone(), total_ms));
        self.emit_warning(warning);

        Ok(record)
    }

    pub async fn toggle(&self) -> Result<Toggled> {
        let running = self.store.read().await.is_running();
        if running {
            self.stop().await.map(Toggled::Stopped)
        } else {
            self.start().await.map(Toggled::Started)
        }
    }

    pub async fn reset(&self) {
        self.stop_ticker().await;

        let warning = {
            let mut store = self.store.write().await;
            let before = store.warning().map(str::to_string);
            store.reset();
            new_warning(&store, before)
        };

        self.emit(TimerEventType::Reset);
        self.emit_warning(warning);
    }

    /// Remove all persisted data, including the session log
    pub async fn clear_all(&self) {
        self.stop_ticker().await;
        self.store.write().await.clear_all();
        self.emit(TimerEventType::Reset);
    }

    /// The view went to the background: save now in case the process is
    /// killed while hidden
    pub async fn on_hidden(&self) -> bool {
        let saved = self.store.write().await.flush_if_running();
        if saved {
            tracing::info!("Hidden - state saved");
        }
        saved
    }

    /// The view is visible again: refresh immediately instead of waiting for
    /// the next tick
    pub async fn on_visible(&self) {
        let (total_ms, running) = {
            let store = self.store.read().await;
            (store.current_total(), store.is_running())
        };
        self.emit(TimerEventType::Refreshed { total_ms, running });
    }

    /// Best-effort final save before the process exits
    pub async fn before_unload(&self) -> bool {
        let saved = self.store.write().await.flush_if_running();
        if saved {
            tracing::info!("Saving state before exit");
        }
        saved
    }

    /// Final save and refresh-task cancellation
    pub async fn shutdown(&self) {
        self.before_unload().await;
        self.stop_ticker().await;
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let store = self.store.read().await;
        let status = store.status();
        TimerSnapshot {
            state: store.state().clone(),
            status,
            status_text: status.to_string(),
            total_ms: store.current_total(),
            session_ms: store.current_session_ms(),
            warning: store.warning().map(str::to_string),
        }
    }

    /// Run a read-only query against the store
    pub async fn read<R>(&self, f: impl FnOnce(&TimerStateStore<S, C>) -> R) -> R {
        let store = self.store.read().await;
        f(&store)
    }

    pub async fn is_ticking(&self) -> bool {
        self.ticker.lock().await.is_active()
    }

    async fn start_ticker(&self) {
        let mut ticker = self.ticker.lock().await;
        ticker.start(self.store.clone(), self.event_tx.clone(), self.tick_interval);
    }

    async fn stop_ticker(&self) {
        self.ticker.lock().await.stop();
    }

    fn emit(&self, event_type: TimerEventType) {
        let _ = self.event_tx.send(TimerEvent::new(event_type));
    }

    fn emit_warning(&self, warning: Option<String>) {
        if let Some(message) = warning {
            let _ = self.event_tx.send(TimerEvent::persist_failed(message));
        }
    }
}

/// A warning raised by the operation that just ran, if any
fn new_warning<S: KeyValueStore, C: Clock>(
    store: &TimerStateStore<S, C>,
    before: Option<String>,
) -> Option<String> {
    match store.warning() {
        Some(current) if before.as_deref() != Some(current) => Some(current.to_string()),
        _ => None,
    }
}
