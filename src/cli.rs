//! Command-line interface parsing for folio
//!
//! This module handles parsing of CLI arguments using clap, the mapping from
//! arguments onto a [`StartupConfig`], and the line commands accepted on stdin
//! while watching prices.

use clap::{Parser, Subcommand};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::data::{CoinSortField, HISTORY_DAY_RANGES};
use crate::refresh::MAX_REFRESH_INTERVAL;

/// Error types for CLI argument parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// History range outside the supported set
    #[error("Invalid days '{0}'. Valid ranges: 1, 7, 30")]
    InvalidDays(u32),

    /// Refresh interval of zero seconds
    #[error("Invalid interval: must be at least 1 second")]
    ZeroInterval,

    /// Refresh interval above one day
    #[error("Invalid interval: must be at most {0} seconds")]
    IntervalTooLong(u64),

    /// Unrecognized line typed while watching
    #[error("Unknown command: '{0}'. Commands: start, stop, refresh, interval <secs>, quit")]
    UnknownCommand(String),
}

impl CliError {
    /// Stable error code printed on failure
    pub fn code(&self) -> &'static str {
        match self {
            CliError::InvalidDays(_) => "api.fetchPriceHistoryFailed",
            CliError::ZeroInterval => "validation.intervalTooShort",
            CliError::IntervalTooLong(_) => "validation.intervalTooLong",
            CliError::UnknownCommand(_) => "cli.unknownCommand",
        }
    }
}

/// folio - crypto market and GitHub profile lookups
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Crypto market data and GitHub profiles with cached, auto-refreshing lookups")]
#[command(version)]
pub struct Cli {
    /// Cache TTL in seconds (overrides FOLIO_CACHE_TTL_SECS)
    #[arg(long, global = true, value_name = "SECS")]
    pub cache_ttl: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the top 10 coins by market cap
    ///
    /// Examples:
    ///   folio prices                      # One snapshot
    ///   folio prices --watch              # Refresh every minute
    ///   folio prices --watch --interval 15
    ///   folio prices --sort change --desc
    Prices {
        /// Keep running and refresh on an interval
        #[arg(long)]
        watch: bool,

        /// Refresh interval in seconds (overrides FOLIO_REFRESH_INTERVAL_SECS)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Sort column: rank, name, price, change, market-cap or volume
        #[arg(long, value_name = "FIELD", default_value = "rank")]
        sort: CoinSortField,

        /// Sort descending instead of ascending
        #[arg(long)]
        desc: bool,
    },

    /// Show a coin's price history as a sampled chart
    History {
        /// CoinGecko coin id, e.g. bitcoin
        coin: String,

        /// History range in days: 1, 7 or 30
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Show a GitHub profile and one page of repositories
    Github {
        /// GitHub username
        username: String,

        /// Repository page, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Environment configuration with CLI overrides applied
    pub config: Config,
    /// What to run
    pub command: Command,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    /// * `base` - Configuration loaded from the environment
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with overrides applied
    /// * `Err(CliError)` if an argument is out of range
    pub fn from_cli(cli: &Cli, base: Config) -> Result<Self, CliError> {
        let mut config = base;

        if let Some(ttl) = cli.cache_ttl {
            config.cache_ttl = Duration::from_secs(ttl);
        }

        match &cli.command {
            Command::Prices {
                interval: Some(secs),
                ..
            } => {
                config.refresh_interval = parse_interval_secs(*secs)?;
            }
            Command::History { days, .. } => {
                if !HISTORY_DAY_RANGES.contains(days) {
                    return Err(CliError::InvalidDays(*days));
                }
            }
            _ => {}
        }

        Ok(StartupConfig {
            config,
            command: cli.command.clone(),
        })
    }
}

/// Converts a seconds count into an interval the scheduler accepts as-is
pub fn parse_interval_secs(secs: u64) -> Result<Duration, CliError> {
    if secs == 0 {
        return Err(CliError::ZeroInterval);
    }
    let max = MAX_REFRESH_INTERVAL.as_secs();
    if secs > max {
        return Err(CliError::IntervalTooLong(max));
    }
    Ok(Duration::from_secs(secs))
}

/// Commands typed on stdin while watching prices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    /// Resume auto-refresh
    Start,
    /// Pause auto-refresh
    Stop,
    /// Drop all cached data and fetch now
    Refresh,
    /// Change the auto-refresh interval
    Interval(Duration),
    /// Leave watch mode
    Quit,
}

/// Parses one stdin line into a [`WatchCommand`]
pub fn parse_watch_command(line: &str) -> Result<WatchCommand, CliError> {
    let line = line.trim().to_lowercase();
    let mut parts = line.split_whitespace();

    let command = match (parts.next(), parts.next(), parts.next()) {
        (Some("start"), None, None) => WatchCommand::Start,
        (Some("stop"), None, None) => WatchCommand::Stop,
        (Some("refresh" | "r"), None, None) => WatchCommand::Refresh,
        (Some("quit" | "q" | "exit"), None, None) => WatchCommand::Quit,
        (Some("interval"), Some(secs), None) => {
            let secs: u64 = secs
                .parse()
                .map_err(|_| CliError::UnknownCommand(line.clone()))?;
            WatchCommand::Interval(parse_interval_secs(secs)?)
        }
        _ => return Err(CliError::UnknownCommand(line.clone())),
    };

    Ok(command)
}
