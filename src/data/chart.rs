//! Chart series built from price history
//!
//! Turns a raw price series into a sampled, labelled series small enough to plot
//! in a terminal. Transformed series get their own expiring cache, layered on
//! top of the history cache in [`CryptoClient`].

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::crypto::coin_name;
use super::{CryptoClient, CryptoError, HISTORY_DAY_RANGES};
use crate::cache::{keys, normalize_param, ExpiringCache};

/// TTL of transformed chart series
pub const CHART_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Target number of points for a 1-day chart
const INTRADAY_TARGET_POINTS: usize = 24;

/// Target number of points for multi-day charts
const MULTI_DAY_TARGET_POINTS: usize = 20;

/// One plotted point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Formatted x-axis label
    pub label: String,
    /// Price in USD, rounded to cents
    pub price: f64,
}

/// A single-series line chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Series title, e.g. "Bitcoin Price"
    pub title: String,
    pub points: Vec<ChartPoint>,
    /// X-axis labels, same order as `points`
    pub labels: Vec<String>,
}

/// Formats a millisecond timestamp for the x-axis
///
/// 1-day charts show `HH:MM`; longer ranges show `Mon D`. Times are UTC.
pub fn format_chart_label(timestamp_ms: i64, days: u32) -> String {
    let Some(datetime) = DateTime::from_timestamp_millis(timestamp_ms) else {
        return timestamp_ms.to_string();
    };

    if days == 1 {
        datetime.format("%H:%M").to_string()
    } else {
        datetime.format("%b %-d").to_string()
    }
}

/// Samples and labels a price series
pub fn transform_to_chart(coin_name: &str, prices: &[(i64, f64)], days: u32) -> ChartData {
    let title = format!("{} Price", coin_name);

    if prices.is_empty() {
        return ChartData {
            title,
            points: Vec::new(),
            labels: Vec::new(),
        };
    }

    let target = if days == 1 {
        INTRADAY_TARGET_POINTS
    } else {
        MULTI_DAY_TARGET_POINTS
    };
    let sample_rate = (prices.len() / target).max(1);

    let points: Vec<ChartPoint> = prices
        .iter()
        .step_by(sample_rate)
        .map(|(timestamp, price)| ChartPoint {
            label: format_chart_label(*timestamp, days),
            price: (price * 100.0).round() / 100.0,
        })
        .collect();
    let labels = points.iter().map(|p| p.label.clone()).collect();

    ChartData {
        title,
        points,
        labels,
    }
}

/// Produces chart series, caching the transformed result
#[derive(Debug, Clone)]
pub struct ChartService {
    crypto: CryptoClient,
    cache: ExpiringCache,
}

impl ChartService {
    /// Creates a chart service with its own 5-minute cache
    pub fn new(crypto: CryptoClient) -> Self {
        Self {
            crypto,
            cache: ExpiringCache::new(CHART_CACHE_TTL),
        }
    }

    /// Returns the chart for a coin over `days` (1, 7 or 30)
    ///
    /// The title comes from the coin id, so the cache key covers everything
    /// that shapes the result.
    pub async fn chart(&self, coin_id: &str, days: u32) -> Result<ChartData, CryptoError> {
        if !HISTORY_DAY_RANGES.contains(&days) {
            return Err(CryptoError::InvalidDays(days));
        }

        let coin_id = normalize_param(coin_id);
        let cache_key = keys::chart(&coin_id, days);
        if let Some(cached) = self.cache.get::<ChartData>(&cache_key) {
            tracing::debug!(key = %cache_key, "chart cache hit");
            return Ok(cached);
        }

        let history = self.crypto.fetch_price_history(&coin_id, days).await?;
        let chart = transform_to_chart(&coin_name(&coin_id), &history.prices, days);

        self.cache.set(&cache_key, &chart);
        Ok(chart)
    }

    /// Drops all transformed series
    pub fn clear(&self) {
        self.cache.clear();
    }
}
