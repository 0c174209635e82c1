//! Core data models and API clients
//!
//! This module contains the data types returned by the market-data and GitHub
//! clients, along with the clients themselves. Every client consults the shared
//! [`ExpiringCache`](crate::cache::ExpiringCache) before going to the network.

pub mod chart;
pub mod crypto;
pub mod github;
pub mod validation;

pub use chart::{ChartData, ChartPoint, ChartService};
pub use crypto::{
    sort_coins, top_movers, CoinSortField, CryptoClient, CryptoError, SortDirection, TopMovers,
    TOP_COIN_IDS,
};
pub use github::{GitHubClient, GitHubError};
pub use validation::{sanitize_username, validate_username, ValidationError};

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Transport-level failure shared by all API clients
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API returned status {0}")]
    Status(StatusCode),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Response parsed but lacked the data we need
    #[error("Missing expected data in response: {0}")]
    MissingData(String),
}

/// Issues a GET request and decodes a JSON body
///
/// Non-2xx statuses are reported as [`FetchError::Status`] without reading the body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, FetchError> {
    send_json(client.get(url).query(query)).await
}

/// Sends a prepared request and decodes a JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// Allowed history ranges, in days
pub const HISTORY_DAY_RANGES: [u32; 3] = [1, 7, 30];

/// Market snapshot for a single coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoCoin {
    /// CoinGecko coin identifier (e.g. "bitcoin")
    pub id: String,
    /// Display name
    pub name: String,
    /// Ticker symbol (e.g. "BTC")
    pub symbol: String,
    /// Icon URL
    pub image: String,
    /// Price in USD
    pub current_price: f64,
    /// Percentage change over 24h (may be negative)
    pub change_24h: f64,
    /// Market capitalization in USD
    pub market_cap: f64,
    /// 24h trading volume in USD
    pub volume_24h: f64,
    /// Position in the top-coin list, starting at 1
    pub rank: u32,
}

/// Historical price series for one coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// `(timestamp_ms, price_usd)` pairs, oldest first
    pub prices: Vec<(i64, f64)>,
    /// When the series was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Public GitHub profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A single GitHub repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: String,
}

/// Profile plus total stars, cached together under one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubProfile {
    pub user: GitHubUser,
    /// Sum of stargazers across the first 100 repositories
    pub total_stars: u64,
}

/// One page of a user's repositories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryPage {
    pub repositories: Vec<GitHubRepo>,
    /// 1-based page number
    pub page: u32,
    /// Whether the page was full, suggesting another page exists
    pub has_more: bool,
}
