//! Interactive foreground view: a live counter driven by the ticker, with
//! line commands on stdin

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{broadcast, mpsc};

use weartime_core::{Clock, format::format_duration, models::Status, storage::KeyValueStore};

use crate::commands::{render_toggled, status_line};
use crate::lifecycle::{self, Lifecycle};
use crate::timer::{TimerController, TimerEventType};

pub const HELP: &str = "[Enter] start/stop  [r] reset  [s] refresh  [q] quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchKey {
    Toggle,
    Reset,
    Refresh,
    Quit,
    Unknown(String),
}

impl WatchKey {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "" => WatchKey::Toggle,
            "r" | "reset" => WatchKey::Reset,
            "s" | "refresh" => WatchKey::Refresh,
            "q" | "quit" | "exit" => WatchKey::Quit,
            other => WatchKey::Unknown(other.to_string()),
        }
    }
}

/// Run until `q`, end of input or an unload signal. The timer keeps running
/// after exit; only the state is saved.
pub async fn run<S, C, R, W>(
    controller: &TimerController<S, C>,
    input: R,
    mut out: W,
    mut signals: mpsc::Receiver<Lifecycle>,
) -> std::io::Result<()>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut events = controller.subscribe();
    let mut lines = input.lines();

    writeln!(out, "{}", HELP)?;
    let snapshot = controller.snapshot().await;
    writeln!(out, "{}", status_line(snapshot.total_ms, &snapshot.status_text))?;
    out.flush()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("Input closed, leaving watch");
                    break;
                };

                match WatchKey::parse(&line) {
                    WatchKey::Toggle => match controller.toggle().await {
                        Ok(toggled) => {
                            let total_ms = controller.read(|store| store.current_total()).await;
                            writeln!(out, "{}", render_toggled(&toggled, total_ms, &chrono::Local))?;
                        }
                        Err(e) => writeln!(out, "Error: {}", e)?,
                    },
                    WatchKey::Reset => controller.reset().await,
                    WatchKey::Refresh => controller.on_visible().await,
                    WatchKey::Quit => break,
                    WatchKey::Unknown(key) => writeln!(out, "Unknown command '{}'. {}", key, HELP)?,
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => render_event(&mut out, &event.event_type)?,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::debug!("Display lagged {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            Some(signal) = signals.recv() => {
                if !lifecycle::handle(controller, signal).await {
                    break;
                }
            }
        }
        out.flush()?;
    }

    controller.shutdown().await;
    writeln!(out)?;
    out.flush()
}

fn render_event<W: Write>(out: &mut W, event: &TimerEventType) -> std::io::Result<()> {
    match event {
        TimerEventType::Tick { total_ms, session_ms } => write!(
            out,
            "\r{}  session {}",
            status_line(*total_ms, Status::Running),
            format_duration(*session_ms)
        ),
        TimerEventType::Refreshed { total_ms, running } => {
            let status = if *running {
                Status::Running
            } else {
                Status::idle(*total_ms)
            };
            writeln!(out, "\r{}", status_line(*total_ms, status))
        }
        TimerEventType::Reset => writeln!(out, "\r{}", status_line(0, Status::Reset)),
        TimerEventType::PersistFailed { message } => writeln!(out, "\rWarning: {}", message),
        TimerEventType::Started { .. }
        | TimerEventType::Stopped { .. }
        | TimerEventType::Reconciled { .. } => Ok(()),
    }
}
