//! Process lifecycle signals mapped onto the timer's visibility hooks
//!
//! ```text
//! SIGHUP            -> Hidden  (terminal went away, save now)
//! SIGTERM / Ctrl-C  -> Unload  (save and exit)
//! ```

use tokio::sync::mpsc;

use weartime_core::{Clock, storage::KeyValueStore};

use crate::timer::TimerController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Hidden,
    Visible,
    Unload,
}

/// Forward OS signals into `tx` until the receiver goes away
#[cfg(unix)]
pub fn spawn_signal_listener(tx: mpsc::Sender<Lifecycle>) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = hangup.recv() => Lifecycle::Hidden,
                _ = terminate.recv() => Lifecycle::Unload,
                _ = tokio::signal::ctrl_c() => Lifecycle::Unload,
            };

            tracing::debug!("Lifecycle signal: {:?}", event);
            if tx.send(event).await.is_err() || event == Lifecycle::Unload {
                break;
            }
        }
    }))
}

/// Forward Ctrl-C into `tx`
#[cfg(not(unix))]
pub fn spawn_signal_listener(tx: mpsc::Sender<Lifecycle>) -> std::io::Result<tokio::task::JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Lifecycle::Unload).await;
        }
    }))
}

/// Run the hook for `event`. Returns `false` once the process should exit.
pub async fn handle<S, C>(controller: &TimerController<S, C>, event: Lifecycle) -> bool
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    match event {
        Lifecycle::Hidden => {
            controller.on_hidden().await;
            true
        }
        Lifecycle::Visible => {
            controller.on_visible().await;
            true
        }
        Lifecycle::Unload => {
            controller.before_unload().await;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::Duration;
    use weartime_core::{
        ManualClock, StorePolicy, TimerStateStore,
        storage::{MemoryStore, keys},
    };

    #[tokio::test]
    async fn test_hidden_saves_running_session() {
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let store = TimerStateStore::with_clock(MemoryStore::new(), clock.clone(), StorePolicy::default());
        let controller = TimerController::new(store, Duration::from_secs(1));
        controller.start().await.unwrap();

        assert!(handle(&controller, Lifecycle::Hidden).await);
        assert!(handle(&controller, Lifecycle::Visible).await);
        assert!(!handle(&controller, Lifecycle::Unload).await);

        let running = controller
            .read(|store| store.storage().get(keys::IS_RUNNING))
            .await;
        assert_eq!(running.as_deref(), Some("true"));
        controller.shutdown().await;
    }
}
