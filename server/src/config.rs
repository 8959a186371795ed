//! Configuration for the health journal server
//!
//! CLI arguments with environment variable fallbacks (clap), after loading an
//! optional `.env` file.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

const DATABASE_FILE_NAME: &str = "health-journal.db";

/// Child Health Journal backend
#[derive(Parser, Debug, Clone)]
#[command(name = "health-journal-server")]
#[command(about = "Medication schedules, intake logs and reminders for one child per household")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// SQLite database URL; defaults to a file in the user's data directory
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Origin allowed to call the API from a browser
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:8080")]
    pub cors_origin: String,

    /// Header carrying the authenticated user id, set by the auth proxy
    #[arg(long, env = "PRINCIPAL_HEADER", default_value = "x-user-id")]
    pub principal_header: String,

    /// Push relay that performs the Web Push delivery; push is disabled when unset
    #[arg(long, env = "PUSH_RELAY_URL")]
    pub push_relay_url: Option<String>,

    /// Bearer token presented to the push relay
    #[arg(long, env = "PUSH_RELAY_TOKEN")]
    pub push_relay_token: Option<String>,

    /// Shared secret required by the notification send and reminder trigger endpoints
    #[arg(long, env = "DISPATCH_TOKEN")]
    pub dispatch_token: Option<String>,

    /// Tracing filter used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Config {
    /// Load `.env` (if present) and parse the command line
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::parse()
    }

    /// Resolve the database URL, falling back to the platform data directory
    pub fn resolved_database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}", default_database_path().display()),
        }
    }

    /// Create the default data directory when no explicit URL was given
    pub fn prepare_database_dir(&self) -> std::io::Result<()> {
        if self.database_url.is_none() {
            if let Some(parent) = default_database_path().parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: None,
            cors_origin: "http://localhost:8080".to_string(),
            principal_header: "x-user-id".to_string(),
            push_relay_url: None,
            push_relay_token: None,
            dispatch_token: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

fn default_database_path() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("health-journal").join(DATABASE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_command_line() {
        let config = Config::try_parse_from(["health-journal-server"]).unwrap();
        assert_eq!(config.principal_header, "x-user-id");
        assert!(config.push_relay_url.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_explicit_database_url_wins() {
        let config = Config {
            database_url: Some("sqlite::memory:".to_string()),
            ..Config::default()
        };
        assert_eq!(config.resolved_database_url(), "sqlite::memory:");

        let fallback = Config::default().resolved_database_url();
        assert!(fallback.starts_with("sqlite://"));
        assert!(fallback.ends_with(DATABASE_FILE_NAME));
    }
}
