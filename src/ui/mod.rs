//! Plain-text rendering for folio output
//!
//! Every function returns a `String` so the binary decides where it goes and
//! tests can assert on exact output.

pub mod sparkline;

use std::fmt::Write;

use crate::data::{
    sort_coins, top_movers, ChartData, CoinSortField, CryptoCoin, GitHubProfile, RepositoryPage,
    SortDirection, TopMovers,
};
use sparkline::PriceSparkline;

/// Widest sparkline printed for a chart
const SPARKLINE_WIDTH: usize = 60;

/// Formats a USD amount with a magnitude suffix (e.g. `$1.23B`)
pub fn format_compact_usd(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    let (scaled, suffix) = if abs >= 1e12 {
        (abs / 1e12, "T")
    } else if abs >= 1e9 {
        (abs / 1e9, "B")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        (abs, "")
    };
    format!("{}${:.2}{}", sign, scaled, suffix)
}

/// Formats a USD price; sub-dollar prices keep more precision
pub fn format_price(price: f64) -> String {
    if price.abs() < 1.0 {
        format!("${:.4}", price)
    } else {
        format!("${:.2}", price)
    }
}

/// Renders the top-coins table
pub fn format_price_table(coins: &[CryptoCoin]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<14} {:<6} {:>14} {:>9} {:>12} {:>12}",
        "#", "Coin", "Symbol", "Price", "24h", "Market Cap", "Volume"
    );

    for coin in coins {
        let _ = writeln!(
            out,
            "{:>3}  {:<14} {:<6} {:>14} {:>+8.2}% {:>12} {:>12}",
            coin.rank,
            coin.name,
            coin.symbol,
            format_price(coin.current_price),
            coin.change_24h,
            format_compact_usd(coin.market_cap),
            format_compact_usd(coin.volume_24h),
        );
    }

    out
}

/// One-line summary of the biggest 24h gainer and loser
pub fn format_top_movers(movers: &TopMovers) -> String {
    format!(
        "Top Gainer: {} ({:+.2}%) | Top Loser: {} ({:+.2}%)",
        movers.gainer.name, movers.gainer.change_24h, movers.loser.name, movers.loser.change_24h
    )
}

/// Renders the movers line (when there is one) above the sorted table
pub fn format_price_report(
    coins: &[CryptoCoin],
    field: CoinSortField,
    direction: SortDirection,
) -> String {
    let table = format_price_table(&sort_coins(coins, field, direction));
    match top_movers(coins) {
        Some(movers) => format!("{}\n{}", format_top_movers(&movers), table),
        None => table,
    }
}

/// Renders a chart as a sparkline with its range and time span
pub fn format_chart(chart: &ChartData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", chart.title);

    if chart.points.is_empty() {
        let _ = writeln!(out, "  (no data)");
        return out;
    }

    let prices: Vec<f64> = chart.points.iter().map(|p| p.price).collect();
    let low = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let _ = writeln!(out, "  {}", PriceSparkline::new(&prices).render(SPARKLINE_WIDTH));
    if let (Some(first), Some(last)) = (chart.labels.first(), chart.labels.last()) {
        let _ = writeln!(out, "  {} -> {}", first, last);
    }
    let _ = writeln!(out, "  low {}  high {}", format_price(low), format_price(high));

    out
}

/// Renders a GitHub profile summary
pub fn format_profile(profile: &GitHubProfile) -> String {
    let user = &profile.user;
    let mut out = String::new();

    match &user.name {
        Some(name) => {
            let _ = writeln!(out, "{} ({})", name, user.login);
        }
        None => {
            let _ = writeln!(out, "{}", user.login);
        }
    }
    if let Some(bio) = &user.bio {
        let _ = writeln!(out, "  {}", bio);
    }
    if let Some(location) = &user.location {
        let _ = writeln!(out, "  Location: {}", location);
    }
    let _ = writeln!(
        out,
        "  Repos: {}  Followers: {}  Following: {}  Stars: {}",
        user.public_repos, user.followers, user.following, profile.total_stars
    );

    out
}

/// Renders one page of repositories
pub fn format_repositories(page: &RepositoryPage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Repositories (page {})", page.page);

    if page.repositories.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for repo in &page.repositories {
        let _ = writeln!(
            out,
            "  {:<30} ★{:<6} {:<12} {}",
            repo.name,
            repo.stargazers_count,
            repo.language.as_deref().unwrap_or("-"),
            repo.description.as_deref().unwrap_or("")
        );
    }
    if page.has_more {
        let _ = writeln!(out, "  more: --page {}", page.page + 1);
    }

    out
}
