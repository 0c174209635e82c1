//! CoinGecko market-data client
//!
//! Fetches the current price snapshot for a fixed list of top coins and the
//! historical price series for a single coin. Both go through the shared
//! expiring cache; failed fetches leave the cache untouched.

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

use super::{get_json, CryptoCoin, FetchError, PriceHistory, HISTORY_DAY_RANGES};
use crate::cache::{keys, normalize_param, ExpiringCache};

/// Base URL for the CoinGecko API
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Top coins by market cap, in rank order
pub const TOP_COIN_IDS: [&str; 10] = [
    "bitcoin",
    "ethereum",
    "binancecoin",
    "cardano",
    "solana",
    "ripple",
    "polkadot",
    "dogecoin",
    "polygon",
    "uniswap",
];

/// Display metadata for a coin: (id, name, symbol, image)
const COIN_METADATA: [(&str, &str, &str, &str); 10] = [
    ("bitcoin", "Bitcoin", "BTC", "https://assets.coingecko.com/coins/images/1/large/bitcoin.png"),
    ("ethereum", "Ethereum", "ETH", "https://assets.coingecko.com/coins/images/279/large/ethereum.png"),
    ("binancecoin", "Binance Coin", "BNB", "https://assets.coingecko.com/coins/images/825/large/bnb-icon2_2x.png"),
    ("cardano", "Cardano", "ADA", "https://assets.coingecko.com/coins/images/975/large/cardano.png"),
    ("solana", "Solana", "SOL", "https://assets.coingecko.com/coins/images/4128/large/solana.png"),
    ("ripple", "XRP", "XRP", "https://assets.coingecko.com/coins/images/44/large/xrp-symbol-white-128.png"),
    ("polkadot", "Polkadot", "DOT", "https://assets.coingecko.com/coins/images/12171/large/polkadot.png"),
    ("dogecoin", "Dogecoin", "DOGE", "https://assets.coingecko.com/coins/images/5/large/dogecoin.png"),
    ("polygon", "Polygon", "MATIC", "https://assets.coingecko.com/coins/images/13442/large/polygon.png"),
    ("uniswap", "Uniswap", "UNI", "https://assets.coingecko.com/coins/images/12504/large/uni.jpg"),
];

/// Looks up display metadata for a coin id
fn coin_metadata(id: &str) -> Option<(&'static str, &'static str, &'static str)> {
    COIN_METADATA
        .iter()
        .find(|(coin_id, ..)| *coin_id == id)
        .map(|(_, name, symbol, image)| (*name, *symbol, *image))
}

/// Human-readable name for a coin id, falling back to the id itself
pub fn coin_name(id: &str) -> String {
    coin_metadata(id)
        .map(|(name, ..)| name.to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Errors that can occur when fetching market data
#[derive(Debug, Error)]
pub enum CryptoError {
    /// History range outside 1, 7 or 30 days
    #[error("Unsupported history range: {0} days (expected 1, 7 or 30)")]
    InvalidDays(u32),

    /// Coin id contains characters CoinGecko never uses
    #[error("Invalid coin id: '{0}'")]
    InvalidCoinId(String),

    /// Price snapshot could not be fetched
    #[error("Failed to fetch prices: {0}")]
    Prices(#[source] FetchError),

    /// Price history could not be fetched
    #[error("Failed to fetch price history: {0}")]
    History(#[source] FetchError),
}

impl CryptoError {
    /// Stable error code for display layers
    pub fn code(&self) -> &'static str {
        match self {
            CryptoError::Prices(_) => "api.fetchCryptoPricesFailed",
            CryptoError::InvalidDays(_)
            | CryptoError::InvalidCoinId(_)
            | CryptoError::History(_) => "api.fetchPriceHistoryFailed",
        }
    }
}

/// Per-coin entry of the `/simple/price` response
#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_market_cap: Option<f64>,
    usd_24h_vol: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// `/coins/{id}/market_chart` response
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

/// Client for the CoinGecko API
#[derive(Debug, Clone)]
pub struct CryptoClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Shared response cache
    cache: ExpiringCache,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl CryptoClient {
    /// Creates a client against the public CoinGecko API
    pub fn new(cache: ExpiringCache) -> Self {
        Self::with_base_url(cache, COINGECKO_BASE_URL)
    }

    /// Creates a client against a custom base URL
    pub fn with_base_url(cache: ExpiringCache, base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            cache,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The cache this client reads and writes
    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    /// Fetches the current snapshot of the top coins
    ///
    /// # Returns
    /// * `Ok(Vec<CryptoCoin>)` - Coins in rank order; coins missing from the response are left out
    /// * `Err(CryptoError::Prices)` - If the request fails or no coin could be mapped
    pub async fn fetch_prices(&self) -> Result<Vec<CryptoCoin>, CryptoError> {
        let cache_key = keys::crypto_prices();

        if let Some(cached) = self.cache.get::<Vec<CryptoCoin>>(&cache_key) {
            tracing::debug!(key = %cache_key, "cache hit");
            return Ok(cached);
        }

        let url = format!("{}/simple/price", self.base_url);
        let query = [
            ("ids", TOP_COIN_IDS.join(",")),
            ("vs_currencies", "usd".to_string()),
            ("include_market_cap", "true".to_string()),
            ("include_24hr_vol", "true".to_string()),
            ("include_24hr_change", "true".to_string()),
        ];

        let response: HashMap<String, SimplePrice> = get_json(&self.http_client, &url, &query)
            .await
            .map_err(CryptoError::Prices)?;
        let coins = parse_prices(&response).map_err(CryptoError::Prices)?;

        self.cache.set(&cache_key, &coins);
        tracing::info!(coins = coins.len(), "fetched crypto prices");
        Ok(coins)
    }

    /// Fetches the price history of one coin
    ///
    /// # Arguments
    /// * `coin_id` - CoinGecko coin id (e.g. "bitcoin"); trimmed and lowercased
    /// * `days` - History range, one of 1, 7 or 30
    pub async fn fetch_price_history(
        &self,
        coin_id: &str,
        days: u32,
    ) -> Result<PriceHistory, CryptoError> {
        if !HISTORY_DAY_RANGES.contains(&days) {
            return Err(CryptoError::InvalidDays(days));
        }
        let coin_id = normalize_param(coin_id);
        validate_coin_id(&coin_id)?;

        let cache_key = keys::crypto_history(&coin_id, days);
        if let Some(cached) = self.cache.get::<PriceHistory>(&cache_key) {
            tracing::debug!(key = %cache_key, "cache hit");
            return Ok(cached);
        }

        let url = format!("{}/coins/{}/market_chart", self.base_url, coin_id);
        let query = [("vs_currency", "usd".to_string()), ("days", days.to_string())];

        let response: MarketChartResponse = get_json(&self.http_client, &url, &query)
            .await
            .map_err(CryptoError::History)?;
        let history = parse_history(response).map_err(CryptoError::History)?;

        self.cache.set(&cache_key, &history);
        tracing::info!(coin = %coin_id, days, points = history.prices.len(), "fetched price history");
        Ok(history)
    }

    /// Drops only the cached price snapshot, then fetches a fresh one
    ///
    /// Used by auto-refresh so history and profile entries keep their TTL.
    pub async fn fetch_latest_prices(&self) -> Result<Vec<CryptoCoin>, CryptoError> {
        self.cache.remove(&keys::crypto_prices());
        self.fetch_prices().await
    }

    /// Drops every cached response, then fetches a fresh price snapshot
    pub async fn refresh_prices(&self) -> Result<Vec<CryptoCoin>, CryptoError> {
        self.cache.clear();
        tracing::debug!("cache cleared for forced refresh");
        self.fetch_prices().await
    }
}

/// CoinGecko ids are lowercase ASCII words joined by hyphens
fn validate_coin_id(coin_id: &str) -> Result<(), CryptoError> {
    let valid = !coin_id.is_empty()
        && coin_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CryptoError::InvalidCoinId(coin_id.to_string()))
    }
}

/// Maps a `/simple/price` response onto ranked coins
fn parse_prices(response: &HashMap<String, SimplePrice>) -> Result<Vec<CryptoCoin>, FetchError> {
    let coins: Vec<CryptoCoin> = TOP_COIN_IDS
        .iter()
        .enumerate()
        .filter_map(|(index, id)| {
            let price = response.get(*id)?;
            let (name, symbol, image) = coin_metadata(id)?;
            Some(CryptoCoin {
                id: id.to_string(),
                name: name.to_string(),
                symbol: symbol.to_string(),
                image: image.to_string(),
                current_price: price.usd.unwrap_or(0.0),
                change_24h: price.usd_24h_change.unwrap_or(0.0),
                market_cap: price.usd_market_cap.unwrap_or(0.0),
                volume_24h: price.usd_24h_vol.unwrap_or(0.0),
                rank: index as u32 + 1,
            })
        })
        .collect();

    if coins.is_empty() {
        return Err(FetchError::MissingData("no known coins in price response".to_string()));
    }
    Ok(coins)
}

/// Validates a market-chart response
fn parse_history(response: MarketChartResponse) -> Result<PriceHistory, FetchError> {
    if response.prices.is_empty() {
        return Err(FetchError::MissingData("empty price series".to_string()));
    }

    Ok(PriceHistory {
        prices: response
            .prices
            .into_iter()
            .map(|(timestamp, price)| (timestamp as i64, price))
            .collect(),
        fetched_at: Utc::now(),
    })
}

/// Column the price table is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoinSortField {
    #[default]
    Rank,
    Name,
    Price,
    Change24h,
    MarketCap,
    Volume24h,
}

impl FromStr for CoinSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rank" => Ok(CoinSortField::Rank),
            "name" => Ok(CoinSortField::Name),
            "price" => Ok(CoinSortField::Price),
            "change" | "change24h" => Ok(CoinSortField::Change24h),
            "market-cap" | "marketcap" | "cap" => Ok(CoinSortField::MarketCap),
            "volume" | "volume24h" => Ok(CoinSortField::Volume24h),
            other => Err(format!(
                "unknown sort field '{}'. Valid fields: rank, name, price, change, market-cap, volume",
                other
            )),
        }
    }
}

/// Sort order for [`sort_coins`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Returns the coins ordered by one column; ties keep their input order
pub fn sort_coins(
    coins: &[CryptoCoin],
    field: CoinSortField,
    direction: SortDirection,
) -> Vec<CryptoCoin> {
    let mut sorted = coins.to_vec();
    sorted.sort_by(|a, b| {
        let ord = match field {
            CoinSortField::Rank => a.rank.cmp(&b.rank),
            CoinSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            CoinSortField::Price => a.current_price.total_cmp(&b.current_price),
            CoinSortField::Change24h => a.change_24h.total_cmp(&b.change_24h),
            CoinSortField::MarketCap => a.market_cap.total_cmp(&b.market_cap),
            CoinSortField::Volume24h => a.volume_24h.total_cmp(&b.volume_24h),
        };
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    sorted
}

/// Biggest 24h gainer and loser of a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct TopMovers {
    pub gainer: CryptoCoin,
    pub loser: CryptoCoin,
}

/// Finds the top gainer and loser by 24h change
///
/// The first coin wins ties. Returns `None` for an empty snapshot or when the
/// same coin is both, which covers single-coin and all-equal snapshots.
pub fn top_movers(coins: &[CryptoCoin]) -> Option<TopMovers> {
    let by_change = |a: &&CryptoCoin, b: &&CryptoCoin| a.change_24h.total_cmp(&b.change_24h);

    let gainer = coins
        .iter()
        .reduce(|best, c| if by_change(&c, &best) == Ordering::Greater { c } else { best })?;
    let loser = coins
        .iter()
        .reduce(|worst, c| if by_change(&c, &worst) == Ordering::Less { c } else { worst })?;

    if gainer.id == loser.id {
        return None;
    }

    Some(TopMovers {
        gainer: gainer.clone(),
        loser: loser.clone(),
    })
}
