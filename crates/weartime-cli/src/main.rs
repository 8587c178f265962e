//! Weartime
//!
//! Tracks daily wear time with a persistent stopwatch.

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use weartime_cli::{
    ConfigManager, FileController, Toggled, commands, lifecycle, open_controller, watch,
};
use weartime_core::{Clock, export, history, storage::init_data_dir};

#[derive(Parser, Debug)]
#[command(name = "weartime")]
#[command(about = "Persistent daily wear-time stopwatch", long_about = None)]
struct Args {
    /// Directory holding the timer state and log file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory holding config.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log level (overrides the config file)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Timer(TimerCommand),
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Commands that operate on the timer state
#[derive(Subcommand, Debug)]
enum TimerCommand {
    /// Show today's total and the timer status
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start a session
    Start,
    /// Stop the running session and log it
    Stop,
    /// Start if stopped, stop if running
    Toggle,
    /// Zero today's counter (history is kept)
    Reset,
    /// List recorded sessions, newest first
    History {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Wear time logged today
    Today,
    /// Daily totals for the last seven days
    Week,
    /// Export the session log
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Live counter with interactive controls
    Watch,
    /// Delete all stored timer data, including history
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Show,
    Set { key: String, value: String },
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager =
        ConfigManager::new(args.config_dir.clone()).context("Failed to load configuration")?;
    let config = config_manager.get().await;

    let data_dir = config_manager.resolve_data_dir(args.data_dir.clone()).await;
    let data_dir = init_data_dir(Some(data_dir)).context("Failed to create data directory")?;

    let log_level = args.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    setup_logging(&data_dir, &log_level)?;

    // Config commands never touch the timer state
    let command = match args.command {
        Some(Command::Config { action }) => return run_config(&config_manager, action).await,
        Some(Command::Timer(command)) => command,
        None => TimerCommand::Status { json: false },
    };

    let controller = open_controller(&config, &data_dir)?;
    let outcome = controller.init().await;
    tracing::debug!("Startup reconciliation: {:?}", outcome);

    let result = run_command(&controller, command).await;
    controller.shutdown().await;
    result
}

fn setup_logging(data_dir: &Path, level: &str) -> Result<()> {
    let log_file_path = data_dir.join("weartime.log");

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .with_context(|| format!("Failed to open log file {}", log_file_path.display()))?;

    // Human output on stderr at the configured level, everything at debug in
    // the log file
    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let stderr_level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let stderr_writer = std::io::stderr.with_max_level(stderr_level);
    let file_writer = log_file.with_max_level(tracing::Level::DEBUG);

    let filter = tracing_subscriber::EnvFilter::try_from_env("WEARTIME_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_writer(stderr_writer.and(file_writer))
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    tracing::debug!("Log file: {}", log_file_path.display());
    Ok(())
}

async fn run_config(manager: &ConfigManager, action: ConfigAction) -> Result<()> {
    let config = match action {
        ConfigAction::Show => manager.get().await,
        ConfigAction::Set { key, value } => manager.set_value(&key, &value).await?,
        ConfigAction::Reset => manager.reset_to_default().await?,
    };

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn run_command(controller: &FileController, command: TimerCommand) -> Result<()> {
    match command {
        TimerCommand::Status { json } => {
            let snapshot = controller.snapshot().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("{}", commands::render_status(&snapshot));
            }
        }
        TimerCommand::Start => {
            let started = controller.start().await?;
            println!(
                "{}",
                commands::render_toggled(&Toggled::Started(started), 0, &Local)
            );
        }
        TimerCommand::Stop => {
            let record = controller.stop().await?;
            let total_ms = controller.read(|store| store.current_total()).await;
            println!(
                "{}",
                commands::render_toggled(&Toggled::Stopped(record), total_ms, &Local)
            );
        }
        TimerCommand::Toggle => {
            let toggled = controller.toggle().await?;
            let total_ms = controller.read(|store| store.current_total()).await;
            println!("{}", commands::render_toggled(&toggled, total_ms, &Local));
        }
        TimerCommand::Reset => {
            controller.reset().await;
            println!("{}", controller.snapshot().await.status_text);
        }
        TimerCommand::History { limit } => {
            let text = controller
                .read(|store| commands::render_history(&history::recent(store.records(), limit), &Local))
                .await;
            println!("{}", text);
        }
        TimerCommand::Today => {
            let total = controller
                .read(|store| {
                    let clock = store.clock();
                    history::daily_total(store.records(), clock, clock.today())
                })
                .await;
            let snapshot = controller.snapshot().await;
            println!(
                "Logged today: {} ({} session(s))",
                weartime_core::format::format_duration(total.total_ms),
                total.sessions
            );
            println!("{}", commands::status_line(snapshot.total_ms, &snapshot.status_text));
        }
        TimerCommand::Week => {
            let totals = controller
                .read(|store| {
                    let clock = store.clock();
                    history::weekly(store.records(), clock, clock.today())
                })
                .await;
            println!("{}", commands::render_week(&totals));
        }
        TimerCommand::Export { format, output } => {
            let records = controller.read(|store| store.records().to_vec()).await;
            match output {
                Some(path) => {
                    let file = fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_export(&records, format, file)?;
                    eprintln!("Exported {} session(s) to {}", records.len(), path.display());
                }
                None => write_export(&records, format, std::io::stdout().lock())?,
            }
        }
        TimerCommand::Watch => {
            let (tx, rx) = mpsc::channel(8);
            let listener = lifecycle::spawn_signal_listener(tx)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            watch::run(controller, stdin, std::io::stdout(), rx).await?;
            listener.abort();
        }
        TimerCommand::Clear { yes } => {
            if !yes {
                bail!("This deletes all timer data and history. Re-run with --yes to confirm.");
            }
            controller.clear_all().await;
            println!("All timer data cleared");
        }
    }

    Ok(())
}

fn write_export<W: Write>(
    records: &[weartime_core::models::SessionRecord],
    format: ExportFormat,
    writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => export::write_csv(records, writer)?,
        ExportFormat::Json => export::write_json(records, writer)?,
    }
    Ok(())
}
