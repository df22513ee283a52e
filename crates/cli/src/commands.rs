//! CLI commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tollgate_core::{Credentials, FileTokenStore, StateDir};
use tollgate_http::{AuthSession, Method};
use tracing::{debug, info};

use crate::config;

/// Options shared by every command
pub struct GlobalOptions {
    pub state: StateDir,
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
}

impl GlobalOptions {
    /// Build the session over the state directory's token file
    fn session(&self) -> Result<AuthSession> {
        let config = config::load_client_config(
            &self.state,
            self.config.as_deref(),
            self.base_url.as_deref(),
        )?;
        self.state.create_directories()?;

        let store = FileTokenStore::new(self.state.tokens_path());
        debug!("Using token file {}", store.path().display());

        let session = AuthSession::from_config(&config, Arc::new(store))
            .context("creating API session")?;
        Ok(session)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the token pair
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "TOLLGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored tokens
    Logout,

    /// Refresh if needed and report whether a session is active
    Status,

    /// Create an account without logging in
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "TOLLGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Make an authenticated request and print the JSON response
    Request {
        /// Path relative to the base URL, e.g. api/test
        path: String,

        #[arg(short = 'X', long, default_value = "GET", value_parser = parse_method)]
        method: Method,

        /// JSON request body
        #[arg(long, value_parser = parse_json)]
        data: Option<Value>,
    },

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Output file path (defaults to the state directory's config/config.json)
        output: Option<PathBuf>,
    },
}

impl Commands {
    pub async fn execute(self, options: GlobalOptions) -> Result<()> {
        match self {
            Commands::Login { username, password } => {
                let session = options.session()?;
                if !session.login(&Credentials::new(username, password)).await {
                    bail!("Login failed");
                }
                println!("Logged In");
                Ok(())
            }
            Commands::Logout => {
                options.session()?.logout();
                println!("Not Logged In");
                Ok(())
            }
            Commands::Status => {
                let (_session, startup) = options.session()?.start();
                if startup.await? {
                    println!("Logged In");
                } else {
                    println!("Not Logged In");
                }
                Ok(())
            }
            Commands::Register { username, password } => {
                let session = options.session()?;
                match session.register(&Credentials::new(username, password)).await {
                    Some(body) => {
                        println!("{}", serde_json::to_string_pretty(&body)?);
                        Ok(())
                    }
                    None => bail!("Registration failed"),
                }
            }
            Commands::Request { path, method, data } => {
                let session = options.session()?;
                let result: Option<Value> = session.fetch_data(&path, method, data.as_ref()).await;
                match result {
                    Some(body) => {
                        println!("{}", serde_json::to_string_pretty(&body)?);
                        Ok(())
                    }
                    None => {
                        println!("null");
                        bail!("Request to {path} failed");
                    }
                }
            }
            Commands::Config { command } => command.execute(&options.state),
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, state: &StateDir) -> Result<()> {
        match self {
            ConfigCommands::Init { output } => {
                let config_path = output.unwrap_or_else(|| state.config_path());
                config::generate_default_config(&config_path)?;
                info!("Generated configuration at {}", config_path.display());
                println!("{}", config_path.display());
                Ok(())
            }
        }
    }
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}
