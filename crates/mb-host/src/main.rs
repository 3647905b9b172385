use std::path::{Path, PathBuf};

use mb_core::services::config_loader::CONFIG_FILENAME;
use mb_host::{cli, commands};

const DEBUG_LOG_FILENAME: &str = ".multibranch-debug.log";

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = cli::parse(&args)?;
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => find_container_root(),
    };

    // Held for the life of the program so buffered lines reach the file.
    let _guard = if cli.debug {
        Some(setup_debug_logging(&root))
    } else {
        setup_stderr_logging();
        None
    };

    commands::run(&root, &cli.command).await
}

/// Configure file-based tracing to `.multibranch-debug.log` in the container
/// root. Returns the guard that must be held alive for the duration of the
/// program.
fn setup_debug_logging(root: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(root, DEBUG_LOG_FILENAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .init();

    guard
}

fn setup_stderr_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Walk up from the working directory to the nearest directory holding a
/// container config. Falls back to the working directory itself.
fn find_container_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut dir = cwd.as_path();
    loop {
        if dir.join(CONFIG_FILENAME).is_file() {
            return dir.to_path_buf();
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }

    cwd
}
