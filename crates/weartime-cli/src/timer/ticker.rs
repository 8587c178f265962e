//! Cancellable periodic display refresh

use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use weartime_core::{Clock, TimerStateStore, storage::KeyValueStore};

use super::events::TimerEvent;

struct Registration {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns at most one running refresh task.
///
/// Each tick only reads the store and broadcasts a [`TimerEvent::tick`]; it
/// never mutates timer state. Starting again cancels the previous task, and
/// dropping the ticker cancels whatever is running.
#[derive(Default)]
pub struct Ticker {
    registration: Option<Registration>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.registration
            .as_ref()
            .is_some_and(|r| !r.cancel.is_cancelled() && !r.task.is_finished())
    }

    pub fn start<S, C>(
        &mut self,
        store: Arc<RwLock<TimerStateStore<S, C>>>,
        event_tx: broadcast::Sender<TimerEvent>,
        period: Duration,
    ) where
        S: KeyValueStore + 'static,
        C: Clock + 'static,
    {
        self.stop();

        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut tick_interval = interval(period);
            tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    _ = token.cancelled() => break,
                    _ = tick_interval.tick() => {
                        let (total_ms, session_ms) = {
                            let store = store.read().await;
                            (store.current_total(), store.current_session_ms())
                        };

                        tracing::trace!("tick total={} session={}", total_ms, session_ms);
                        let _ = event_tx.send(TimerEvent::tick(total_ms, session_ms));
                    }
                }
            }

            tracing::debug!("Refresh task stopped");
        });

        tracing::debug!("Refresh task started ({} ms)", period.as_millis());
        self.registration = Some(Registration { cancel, task });
    }

    /// Cancel the running task. A tick blocked on the store lock is
    /// aborted too, so nothing is sent after this returns.
    pub fn stop(&mut self) {
        if let Some(registration) = self.registration.take() {
            registration.cancel.cancel();
            registration.task.abort();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
