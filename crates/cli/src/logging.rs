use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_NAME: &str = "cli.log";

/// Initialize logging for the CLI
///
/// Logs always go to stderr so stdout stays free for command output. Unless
/// `no_file_log` is set they are also written to `cli.log` in `data_dir`,
/// which is truncated on every run.
pub fn init_logging(log_level: Level, data_dir: &Path, no_file_log: bool) -> Result<()> {
    if no_file_log {
        init_stderr_logging(log_level)
    } else {
        init_file_logging(log_level, data_dir)
    }
}

fn env_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("tollgate={level_str},tollgate_core={level_str},tollgate_http={level_str}").into()
    })
}

fn init_file_logging(level: Level, data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(data_dir.join(LOG_FILE_NAME))?;

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

fn init_stderr_logging(level: Level) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
