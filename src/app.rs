//! Application state and command runners for folio
//!
//! This module owns the shared cache and API clients, runs the one-shot
//! subcommands, and drives watch mode: a refresh schedule plus line commands
//! read from stdin.

use chrono::{DateTime, Local};
use std::future::Future;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;

use crate::cache::{normalize_param, ExpiringCache};
use crate::cli::{parse_watch_command, Command, WatchCommand};
use crate::config::Config;
use crate::data::{
    ChartService, CoinSortField, CryptoClient, CryptoCoin, CryptoError, GitHubClient, GitHubError,
    SortDirection,
};
use crate::refresh::{refetch_fn, RefreshConfig, RefreshMessage, RefreshScheduler};
use crate::ui;

/// Errors surfaced to the binary
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// Writing output failed
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Stable error code printed on failure
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Crypto(e) => e.code(),
            AppError::GitHub(e) => e.code(),
            AppError::Io(_) => "app.outputFailed",
        }
    }
}

/// Main application struct managing clients and watch-mode state
pub struct App {
    /// Flag indicating watch mode should end
    pub should_quit: bool,
    /// Timestamp of the last successful price refresh
    pub last_refresh: Option<DateTime<Local>>,
    /// Most recent refresh failure, cleared by the next success
    pub last_error: Option<String>,
    /// Column the price table is sorted by
    pub sort_field: CoinSortField,
    /// Direction of the price table sort
    pub sort_direction: SortDirection,
    /// Latest price snapshot, written by background refreshes
    latest_prices: Arc<Mutex<Vec<CryptoCoin>>>,
    /// Live auto-refresh interval; the scheduler holds a receiver
    refresh_interval: watch::Sender<Duration>,
    /// CoinGecko client
    crypto_client: CryptoClient,
    /// Chart series on top of the price history cache
    chart_service: ChartService,
    /// GitHub client
    github_client: GitHubClient,
}

impl App {
    /// Creates an App from runtime configuration
    ///
    /// Both API clients share one cache with the configured TTL.
    pub fn new(config: &Config) -> Self {
        let cache = ExpiringCache::new(config.cache_ttl);
        Self::with_clients(
            CryptoClient::with_base_url(cache.clone(), &config.coingecko_url),
            GitHubClient::with_base_url(cache, &config.github_url),
            config.refresh_interval,
        )
    }

    /// Creates an App with custom clients (for testing)
    pub fn with_clients(
        crypto_client: CryptoClient,
        github_client: GitHubClient,
        refresh_interval: Duration,
    ) -> Self {
        let (refresh_interval, _) = watch::channel(refresh_interval);
        Self {
            should_quit: false,
            last_refresh: None,
            last_error: None,
            sort_field: CoinSortField::default(),
            sort_direction: SortDirection::default(),
            latest_prices: Arc::new(Mutex::new(Vec::new())),
            refresh_interval,
            chart_service: ChartService::new(crypto_client.clone()),
            crypto_client,
            github_client,
        }
    }

    /// Current auto-refresh interval
    pub fn refresh_interval(&self) -> Duration {
        *self.refresh_interval.borrow()
    }

    /// Latest price snapshot seen by this app
    pub fn latest_prices(&self) -> Vec<CryptoCoin> {
        self.latest_prices
            .lock()
            .map(|prices| prices.clone())
            .unwrap_or_default()
    }

    /// Sets the price table order; `descending` flips the default ascending order
    pub fn set_price_order(&mut self, field: CoinSortField, descending: bool) {
        self.sort_field = field;
        self.sort_direction = if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
    }

    fn render_prices(&self, coins: &[CryptoCoin]) -> String {
        ui::format_price_report(coins, self.sort_field, self.sort_direction)
    }

    fn store_prices(&mut self, coins: Vec<CryptoCoin>) {
        store(&self.latest_prices, coins);
        self.last_refresh = Some(Local::now());
        self.last_error = None;
    }

    /// Runs a one-shot subcommand and returns its rendered output
    ///
    /// `prices --watch` is not handled here; see [`App::watch_prices`].
    pub async fn run(&mut self, command: &Command) -> Result<String, AppError> {
        match command {
            Command::Prices { sort, desc, .. } => {
                self.set_price_order(*sort, *desc);
                self.prices_report().await
            }
            Command::History { coin, days } => self.history_report(coin, *days).await,
            Command::Github { username, page } => self.github_report(username, *page).await,
        }
    }

    /// Renders the top-coins table in the current order
    pub async fn prices_report(&mut self) -> Result<String, AppError> {
        let coins = self.crypto_client.fetch_prices().await?;
        let table = self.render_prices(&coins);
        self.store_prices(coins);
        Ok(table)
    }

    /// Renders a coin's price chart
    pub async fn history_report(&self, coin: &str, days: u32) -> Result<String, AppError> {
        let coin_id = normalize_param(coin);
        let chart = self
            .chart_service
            .chart(&coin_id, days)
            .await?;
        Ok(ui::format_chart(&chart))
    }

    /// Renders a GitHub profile followed by one page of repositories
    pub async fn github_report(&self, username: &str, page: u32) -> Result<String, AppError> {
        let (profile, repositories) = futures::try_join!(
            self.github_client.fetch_profile(username),
            self.github_client.fetch_repositories(username, page)
        )?;

        Ok(format!(
            "{}\n{}",
            ui::format_profile(&profile),
            ui::format_repositories(&repositories)
        ))
    }

    /// Shows prices and keeps them fresh until `quit`, end of input or `shutdown`
    ///
    /// # Arguments
    /// * `input` - Line commands (stdin in the binary)
    /// * `out` - Where tables and status lines are written
    /// * `shutdown` - Resolves to end watch mode (Ctrl-C in the binary)
    pub async fn watch_prices<R, W>(
        &mut self,
        input: R,
        out: &mut W,
        shutdown: impl Future,
    ) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        match self.crypto_client.fetch_prices().await {
            Ok(coins) => {
                writeln!(out, "{}", self.render_prices(&coins))?;
                self.store_prices(coins);
            }
            Err(e) => {
                writeln!(out, "Refresh failed: {}", e.code())?;
                self.last_error = Some(e.to_string());
            }
        }

        let crypto = self.crypto_client.clone();
        let latest = Arc::clone(&self.latest_prices);
        let refetch = refetch_fn(move || {
            let crypto = crypto.clone();
            let latest = Arc::clone(&latest);
            async move {
                let coins = crypto
                    .fetch_latest_prices()
                    .await
                    .map_err(|e| format!("{}: {}", e.code(), e))?;
                store(&latest, coins);
                Ok::<(), String>(())
            }
        });

        let (mut scheduler, mut messages) = RefreshScheduler::spawn(
            refetch,
            self.refresh_interval.subscribe(),
            RefreshConfig::default(),
        );
        writeln!(
            out,
            "Auto-refresh every {}s. Commands: start, stop, refresh, interval <secs>, quit",
            self.refresh_interval().as_secs()
        )?;

        let mut lines = input.lines();
        let mut input_open = true;
        tokio::pin!(shutdown);

        while !self.should_quit {
            tokio::select! {
                Some(msg) = messages.recv() => {
                    if let Some(text) = self.handle_refresh_message(msg) {
                        writeln!(out, "{}", text)?;
                    }
                }
                line = lines.next_line(), if input_open => {
                    match line {
                        Ok(Some(line)) if line.trim().is_empty() => {}
                        Ok(Some(line)) => {
                            let text = match parse_watch_command(&line) {
                                Ok(command) => self.handle_command(command, &mut scheduler).await,
                                Err(e) => e.to_string(),
                            };
                            writeln!(out, "{}", text)?;
                        }
                        Ok(None) => {
                            tracing::debug!("command input closed");
                            self.should_quit = true;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to read command input");
                            input_open = false;
                        }
                    }
                }
                _ = &mut shutdown => {
                    self.should_quit = true;
                }
            }
        }

        scheduler.shutdown();
        Ok(())
    }

    /// Applies a scheduler message and returns a line to show, if any
    pub fn handle_refresh_message(&mut self, msg: RefreshMessage) -> Option<String> {
        match msg {
            RefreshMessage::RefreshStarted => None,
            RefreshMessage::TickSkipped => {
                tracing::debug!("refresh tick skipped");
                None
            }
            RefreshMessage::RefreshCompleted => {
                let coins = self.latest_prices();
                self.last_refresh = Some(Local::now());
                self.last_error = None;
                Some(format!(
                    "Updated {}\n{}",
                    Local::now().format("%H:%M:%S"),
                    self.render_prices(&coins)
                ))
            }
            RefreshMessage::RefreshError(e) => {
                let text = format!("Refresh failed: {}", e);
                self.last_error = Some(e);
                Some(text)
            }
        }
    }

    /// Applies a watch-mode command and returns a status line
    pub async fn handle_command(
        &mut self,
        command: WatchCommand,
        scheduler: &mut RefreshScheduler,
    ) -> String {
        match command {
            WatchCommand::Start => {
                scheduler.start();
                format!("Auto-refresh on (every {}s)", self.refresh_interval().as_secs())
            }
            WatchCommand::Stop => {
                scheduler.stop();
                "Auto-refresh paused".to_string()
            }
            WatchCommand::Interval(interval) => {
                self.refresh_interval.send_replace(interval);
                format!("Auto-refresh interval set to {}s", interval.as_secs())
            }
            WatchCommand::Refresh => {
                self.chart_service.clear();
                match self.crypto_client.refresh_prices().await {
                    Ok(coins) => {
                        let table = self.render_prices(&coins);
                        self.store_prices(coins);
                        table
                    }
                    Err(e) => {
                        let text = format!("Refresh failed: {}", e.code());
                        self.last_error = Some(e.to_string());
                        text
                    }
                }
            }
            WatchCommand::Quit => {
                self.should_quit = true;
                "Bye".to_string()
            }
        }
    }
}

fn store(latest: &Mutex<Vec<CryptoCoin>>, coins: Vec<CryptoCoin>) {
    match latest.lock() {
        Ok(mut guard) => *guard = coins,
        Err(poisoned) => *poisoned.into_inner() = coins,
    }
}
