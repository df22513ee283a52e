//! Tollgate CLI - log in to a JWT-protected API and make authenticated requests

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use std::time::Duration;
use tollgate_core::StateDir;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "tollgate")]
#[command(about = "Keep a JWT session against an API and call it")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// State directory holding configuration, tokens and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to the state directory's config.json)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// API base URL, overriding the configuration file
    #[arg(long, global = true, env = "TOLLGATE_BASE_URL")]
    base_url: Option<String>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn state_dir(&self) -> StateDir {
        match &self.data_dir {
            Some(dir) => StateDir::with_override(dir),
            None => StateDir::new(),
        }
    }

    fn options(&self) -> commands::GlobalOptions {
        commands::GlobalOptions {
            state: self.state_dir(),
            config: self.config.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = cli.options();
    logging::init_logging(
        cli.log_level.clone().into(),
        &options.state.data_dir(),
        cli.no_file_log,
    )?;

    debug!("Starting Tollgate CLI");

    let outcome = if cli.timeout == 0 {
        cli.command.execute(options).await
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(options)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "Command timed out after {} seconds",
                cli.timeout
            )),
        }
    };

    match outcome {
        Ok(()) => {
            debug!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            std::process::exit(1);
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
