use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskd::{
    config::DaemonConfig,
    rest,
    store::{views, TaskPatch, TaskStore},
    AppContext,
};

#[derive(Parser)]
#[command(
    name = "taskd",
    about = "taskd — single-user task list daemon with a REST API",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST API port
    #[arg(long, env = "TASKD_PORT")]
    port: Option<u16>,

    /// Data directory for tasks.json and config.toml
    #[arg(long, env = "TASKD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKD_LOG")]
    log: Option<String>,

    /// Bind address for the REST server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TASKD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TASKD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,

    /// Suppress progress and informational output.
    ///
    /// Errors are still printed to stderr. JSON output (--json flags) is
    /// unaffected. Use this flag when piping output to other tools.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default when no subcommand given).
    ///
    /// Runs taskd in the foreground and serves the task API.
    ///
    /// Examples:
    ///   taskd serve
    ///   taskd
    Serve,
    /// Manage tasks directly from the command line.
    ///
    /// Opens the task file without going through the HTTP server, so these
    /// commands work whether or not the daemon is running. Do not run them
    /// against the data directory of a live server — both sides rewrite
    /// tasks.json in full and the last writer wins.
    ///
    /// Examples:
    ///   taskd tasks add "buy milk"
    ///   taskd tasks list --pending
    ///   taskd tasks done 3
    ///   taskd tasks summary --json
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },
}

#[derive(Subcommand)]
enum TasksAction {
    /// List tasks, optionally filtered to pending or completed.
    ///
    /// Examples:
    ///   taskd tasks list
    ///   taskd tasks list --completed
    ///   taskd tasks list --json
    List {
        /// Only tasks not yet completed
        #[arg(long)]
        pending: bool,
        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        completed: bool,
        /// Output as JSON array (for piping)
        #[arg(long)]
        json: bool,
    },
    /// Add a new task.
    ///
    /// Examples:
    ///   taskd tasks add "buy milk"
    ///   taskd tasks add "water plants" --completed
    Add {
        /// Task text (must be non-empty)
        text: String,
        /// Create the task already completed
        #[arg(long)]
        completed: bool,
    },
    /// Mark a task completed.
    ///
    /// Examples:
    ///   taskd tasks done 3
    Done {
        /// Task ID
        id: String,
    },
    /// Mark a completed task pending again.
    ///
    /// Examples:
    ///   taskd tasks reopen 3
    Reopen {
        /// Task ID
        id: String,
    },
    /// Replace a task's text.
    ///
    /// Examples:
    ///   taskd tasks edit 3 "buy oat milk"
    Edit {
        /// Task ID
        id: String,
        /// New task text (must be non-empty)
        text: String,
    },
    /// Delete a task permanently.
    ///
    /// Examples:
    ///   taskd tasks rm 3
    Rm {
        /// Task ID
        id: String,
    },
    /// Show task counts and completion progress.
    ///
    /// Examples:
    ///   taskd tasks summary
    ///   taskd tasks summary --json
    Summary {
        /// Output raw JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ── Logging setup ────────────────────────────────────────────────────────
    // Init once — must happen before any tracing calls. The serve path
    // resolves the config first so `log` / `log_format` from config.toml
    // take effect; the CLI path stays quiet unless asked for more.
    match args.command {
        Some(Command::Tasks { action }) => {
            let log_level = args.log.as_deref().unwrap_or("error").to_owned();
            let log_format =
                std::env::var("TASKD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
            let _file_guard = setup_logging(&log_level, args.log_file.as_deref(), &log_format);
            run_tasks(action, args.data_dir, args.quiet).await?;
        }
        None | Some(Command::Serve) => {
            let config = Arc::new(DaemonConfig::new(
                args.port,
                args.data_dir,
                args.log,
                args.bind_address,
            ));
            let _file_guard =
                setup_logging(&config.log, args.log_file.as_deref(), &config.log_format);
            run_server(config).await?;
        }
    }

    Ok(())
}

async fn run_server(config: Arc<DaemonConfig>) -> Result<()> {
    let store = Arc::new(
        TaskStore::open(&config.data_dir)
            .await
            .with_context(|| format!("failed to open task store in {}", config.data_dir.display()))?,
    );
    let ctx = Arc::new(AppContext {
        config,
        store,
        started_at: std::time::Instant::now(),
    });
    rest::start_rest_server(ctx).await
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("taskd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            // Fall back to stdout-only — don't panic on a bad log path.
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}

// ── taskd tasks ───────────────────────────────────────────────────────────────

/// Open the task store for CLI commands (no server — direct file access).
async fn open_store(data_dir: Option<std::path::PathBuf>) -> Result<TaskStore> {
    let config = DaemonConfig::new(None, data_dir, Some("error".to_string()), None);
    TaskStore::open(&config.data_dir)
        .await
        .with_context(|| format!("failed to open task store in {}", config.data_dir.display()))
}

async fn run_tasks(
    action: TasksAction,
    data_dir: Option<std::path::PathBuf>,
    quiet: bool,
) -> Result<()> {
    let store = open_store(data_dir).await?;

    match action {
        TasksAction::List {
            pending,
            completed,
            json,
        } => {
            let all = store.list().await;
            let tasks: Vec<&taskd::store::Task> = if pending {
                views::pending(&all)
            } else if completed {
                views::completed(&all)
            } else {
                all.iter().collect()
            };
            if json {
                println!("{}", serde_json::to_string(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                println!("{:<6} {:<5} TEXT", "ID", "DONE");
                println!("{}", "-".repeat(60));
                for t in &tasks {
                    println!("{:<6} {:<5} {}", t.id, if t.completed { "x" } else { "-" }, t.text);
                }
                println!("\n{} task(s)", tasks.len());
            }
        }

        TasksAction::Add { text, completed } => {
            if text.trim().is_empty() {
                anyhow::bail!("task text must not be empty");
            }
            let t = store.create(text.trim().to_string(), completed).await?;
            if !quiet {
                println!("Added: {} — {}", t.id, t.text);
            }
        }

        TasksAction::Done { id } => {
            let t = store
                .update(
                    &id,
                    TaskPatch {
                        completed: Some(true),
                        ..Default::default()
                    },
                )
                .await?;
            if !quiet {
                println!("Done: {} — {}", t.id, t.text);
            }
        }

        TasksAction::Reopen { id } => {
            let t = store
                .update(
                    &id,
                    TaskPatch {
                        completed: Some(false),
                        ..Default::default()
                    },
                )
                .await?;
            if !quiet {
                println!("Reopened: {} — {}", t.id, t.text);
            }
        }

        TasksAction::Edit { id, text } => {
            if text.trim().is_empty() {
                anyhow::bail!("task text must not be empty");
            }
            let t = store
                .update(
                    &id,
                    TaskPatch {
                        text: Some(text.trim().to_string()),
                        ..Default::default()
                    },
                )
                .await?;
            if !quiet {
                println!("Edited: {} — {}", t.id, t.text);
            }
        }

        TasksAction::Rm { id } => {
            store.delete(&id).await?;
            if !quiet {
                println!("Removed: {id}");
            }
        }

        TasksAction::Summary { json } => {
            let all = store.list().await;
            let done = views::completed(&all).len();
            let pending = views::pending(&all).len();
            let progress = views::progress_percent(&all);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "total": all.len(),
                        "pending": pending,
                        "done": done,
                        "progress_percent": progress,
                    }))?
                );
            } else {
                let bar = "━".repeat(40);
                println!("Task Summary");
                println!("{bar}");
                println!("Total:    {}", all.len());
                println!("Pending:  {pending}");
                println!("Done:     {done}");
                println!("Progress: {progress}%");
            }
        }
    }

    Ok(())
}
