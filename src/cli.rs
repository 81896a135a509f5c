//! Command-line interface parsing for Evotherm
//!
//! This module handles parsing of CLI arguments using clap, including the
//! optional room argument and the --watch polling mode.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The watch interval must be at least one second
    #[error("Invalid watch interval: {0}. The interval must be at least 1 second")]
    InvalidInterval(u64),
}

/// Evotherm - View Honeywell Evohome room temperatures
#[derive(Parser, Debug)]
#[command(name = "evotherm")]
#[command(about = "Honeywell Evohome room temperatures with local caching")]
#[command(version)]
pub struct Cli {
    /// Evohome account username (usually an email address)
    #[arg(short, long)]
    pub username: String,

    /// Evohome account password
    #[arg(short, long)]
    pub password: String,

    /// Room to show; omit to list every room
    pub room: Option<String>,

    /// Bypass the cache and fetch fresh readings
    #[arg(long)]
    pub force_refresh: bool,

    /// Keep polling every N seconds instead of printing once
    #[arg(long, value_name = "SECONDS")]
    pub watch: Option<u64>,

    /// Log remote request/response detail
    #[arg(long)]
    pub debug: bool,
}

/// Run configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Room to show, or `None` to list every room
    pub room: Option<String>,
    /// Whether to bypass the cache on the first read
    pub force_refresh: bool,
    /// Polling interval when watching, or `None` to print once and exit
    pub watch: Option<Duration>,
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with validated settings
    /// * `Err(CliError)` if the watch interval is zero
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let watch = match cli.watch {
            None => None,
            Some(0) => return Err(CliError::InvalidInterval(0)),
            Some(secs) => Some(Duration::from_secs(secs)),
        };
        Ok(RunConfig {
            room: cli.room.clone(),
            force_refresh: cli.force_refresh,
            watch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec!["evotherm", "--username", "u@example.com", "--password", "p"]
    }

    #[test]
    fn test_cli_parse_minimal_args() {
        let cli = Cli::parse_from(base_args());
        assert_eq!(cli.username, "u@example.com");
        assert_eq!(cli.password, "p");
        assert!(cli.room.is_none());
        assert!(!cli.force_refresh);
        assert!(cli.watch.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_parse_room_positional() {
        let mut args = base_args();
        args.push("Lounge");
        let cli = Cli::parse_from(args);
        assert_eq!(cli.room.as_deref(), Some("Lounge"));
    }

    #[test]
    fn test_cli_parse_force_refresh_flag() {
        let mut args = base_args();
        args.push("--force-refresh");
        let cli = Cli::parse_from(args);
        assert!(cli.force_refresh);
    }

    #[test]
    fn test_cli_parse_watch_interval() {
        let mut args = base_args();
        args.extend(["--watch", "60"]);
        let cli = Cli::parse_from(args);
        assert_eq!(cli.watch, Some(60));
    }

    #[test]
    fn test_run_config_defaults_to_single_shot() {
        let cli = Cli::parse_from(base_args());
        let config = RunConfig::from_cli(&cli).unwrap();
        assert!(config.room.is_none());
        assert!(!config.force_refresh);
        assert!(config.watch.is_none());
    }

    #[test]
    fn test_run_config_watch_interval_converted() {
        let mut args = base_args();
        args.extend(["--watch", "30"]);
        let cli = Cli::parse_from(args);
        let config = RunConfig::from_cli(&cli).unwrap();
        assert_eq!(config.watch, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_run_config_zero_watch_interval_rejected() {
        let mut args = base_args();
        args.extend(["--watch", "0"]);
        let cli = Cli::parse_from(args);
        let result = RunConfig::from_cli(&cli);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid watch interval"));
    }
}
