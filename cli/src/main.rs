use std::sync::Arc;

use clap::Parser;
use codelib_cli::commands::{chunks, cli, tasks, templates};
use codelib_cli::notify::TerminalNotifier;
use codelib_core::api::{CliError, Notifier, TaskEvent, Workbench, WorkbenchError, WorkbenchSettings};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let mut cfg =
        codelib_core::config::load_default().map_err(|e| CliError::Config(e.to_string()))?;
    if let Some(url) = args.backend_url.as_deref().filter(|u| !u.trim().is_empty()) {
        cfg.backend.base_url = url.trim().to_string();
    }
    if let Some(ms) = args.timeout_ms {
        cfg.backend.timeout_ms = ms;
    }
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    let backend = codelib_plugins::factory::build_backend(&cfg)
        .map_err(|e| CliError::Config(e.to_string()))?;
    let notifier = Arc::new(TerminalNotifier::detect(args.quiet));
    let mut wb = Workbench::new(backend, notifier.clone(), WorkbenchSettings::from(&cfg));

    let mut event_rx = wb.tasks().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            match event {
                TaskEvent::Added { task_id, .. } => {
                    tracing::debug!("Task tracked: {}", task_id);
                }
                TaskEvent::Updated {
                    task_id, status, ..
                } => {
                    tracing::debug!("Task {} -> {}", task_id, status);
                }
                TaskEvent::Removed { task_id, .. } => {
                    tracing::debug!("Task removed: {}", task_id);
                }
                TaskEvent::Swept { task_ids, .. } => {
                    tracing::debug!("Swept {} finished tasks", task_ids.len());
                }
            }
        }
    });

    let result = dispatch(args.command, args.format, &mut wb).await;
    notifier.set_loading(false);
    wb.shutdown();
    result
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 1: task finished unsuccessfully (returned as a normal exit code)
    // 11: config error
    // 20: backend / IO error
    // 30: rejected locally before any request
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Workbench(we) => match we {
            WorkbenchError::Client(_) => 30,
            WorkbenchError::Backend(_) => 20,
        },
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

async fn dispatch(
    cmd: cli::Commands,
    format: cli::OutputFormat,
    wb: &mut Workbench,
) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Ingest(args) => tasks::ingest(wb, args, format).await,
        cli::Commands::Status(args) => tasks::status(wb, args, format).await,
        cli::Commands::Search(args) => chunks::search(wb, args, format).await,
        cli::Commands::Show(args) => chunks::show(wb, args, format).await,
        cli::Commands::Split(args) => chunks::split(wb, args, format).await,
        cli::Commands::Merge(args) => chunks::merge(wb, args, format).await,
        cli::Commands::Complete(args) => chunks::complete(wb, args, format).await,
        cli::Commands::Templates(cmd) => templates::run(wb, cmd, format).await,
    }
}

fn init_tracing(logging: &codelib_core::config::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("codelib"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("codelib.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
