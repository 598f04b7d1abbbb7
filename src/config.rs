use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Healthtrack API client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the Healthtrack API
    #[arg(
        short = 'u',
        long,
        env = "HEALTHTRACK_API_BASE_URL",
        default_value = "http://localhost:8000/api"
    )]
    pub base_url: String,

    /// Path to the persisted session database
    #[arg(short = 's', long, env = "HEALTHTRACK_SESSION_FILE")]
    pub session_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and persist the session
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Create a new account
    Register,

    /// Clear the persisted session
    Logout,

    /// Show the currently signed-in user
    Whoami,

    /// List your health measurements
    Measurements,

    /// Record a new health measurement
    Record {
        /// Weight in kilograms
        #[arg(long)]
        weight: Option<f64>,

        /// Systolic blood pressure
        #[arg(long)]
        systolic: Option<i32>,

        /// Diastolic blood pressure
        #[arg(long)]
        diastolic: Option<i32>,

        /// Blood glucose in mmol/L
        #[arg(long)]
        glucose: Option<f64>,

        /// Heart rate in bpm
        #[arg(long)]
        heart_rate: Option<i32>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    // API endpoint
    pub api_base_url: String,

    // Session persistence
    pub session_file: PathBuf,

    // HTTP client
    pub http_max_connections: usize,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        // Parse CLI arguments
        let args = CliArgs::parse();

        let config = Config {
            api_base_url: normalize_base_url(&args.base_url),

            session_file: args
                .session_file
                .map(|s| expand_tilde(&s))
                .map(Ok)
                .unwrap_or_else(default_session_file)?,

            http_max_connections: std::env::var("HTTP_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8),

            http_connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            http_request_timeout: args.http_timeout,

            log_level: args.log_level,
        };

        Ok((config, args.command))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api_base_url))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("API base URL must be http or https: {}", self.api_base_url);
        }

        Ok(())
    }
}

/// Default location of the session database
fn default_session_file() -> Result<PathBuf> {
    let dir = dirs::data_local_dir().context("Could not determine local data directory")?;
    Ok(dir.join("healthtrack").join("session.sqlite3"))
}

/// Strip trailing slashes so paths can be joined with a single '/'
fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}
