//! Integration tests for the API clients
//!
//! Each test starts an in-process stub of the CoinGecko or GitHub endpoints and
//! counts how many requests actually reach it.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use folio::cache::ExpiringCache;
use folio::data::{ChartService, CryptoClient, GitHubClient};

// == Helper Functions ==

#[derive(Default)]
struct Stub {
    price_hits: AtomicUsize,
    history_hits: AtomicUsize,
    user_hits: AtomicUsize,
    repo_hits: AtomicUsize,
    /// When set, every endpoint answers 500
    failing: AtomicBool,
    user_agents: Mutex<Vec<String>>,
    repo_queries: Mutex<Vec<HashMap<String, String>>>,
}

impl Stub {
    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }
}

async fn simple_price(State(stub): State<Arc<Stub>>) -> Response {
    stub.price_hits.fetch_add(1, Ordering::SeqCst);
    if stub.is_failing() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({
        "bitcoin": {
            "usd": 43250.5,
            "usd_market_cap": 845000000000.0,
            "usd_24h_vol": 21000000000.0,
            "usd_24h_change": 2.35
        },
        "ethereum": { "usd": 2280.1, "usd_24h_change": -1.2 }
    }))
    .into_response()
}

async fn market_chart(
    State(stub): State<Arc<Stub>>,
    Path(coin): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    stub.history_hits.fetch_add(1, Ordering::SeqCst);
    if stub.is_failing() || coin != "bitcoin" {
        return StatusCode::NOT_FOUND.into_response();
    }
    let days: i64 = query.get("days").and_then(|d| d.parse().ok()).unwrap_or(1);
    let prices: Vec<Value> = (0..days * 24)
        .map(|i| json!([1_705_314_600_000_i64 + i * 3_600_000, 40000.0 + i as f64]))
        .collect();
    Json(json!({ "prices": prices })).into_response()
}

async fn user(
    State(stub): State<Arc<Stub>>,
    Path(login): Path<String>,
    headers: HeaderMap,
) -> Response {
    stub.user_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(agent) = headers.get("user-agent").and_then(|v| v.to_str().ok()) {
        stub.user_agents.lock().unwrap().push(agent.to_string());
    }
    if stub.is_failing() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({ "login": login, "name": "The Octocat", "public_repos": 12, "followers": 3 }))
        .into_response()
}

async fn repos(
    State(stub): State<Arc<Stub>>,
    Path(_login): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    stub.repo_hits.fetch_add(1, Ordering::SeqCst);
    stub.repo_queries.lock().unwrap().push(query.clone());
    if stub.is_failing() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    // 12 repositories with 1..=12 stars
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = query.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(30);
    let all: Vec<Value> = (1..=12)
        .map(|i| json!({ "id": i, "name": format!("repo-{}", i), "stargazers_count": i }))
        .collect();
    let page_items: Vec<Value> = all
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();
    Json(Value::Array(page_items)).into_response()
}

/// Serves the stub on an ephemeral port and returns its base URL
async fn spawn_stub(stub: Arc<Stub>) -> String {
    let router = Router::new()
        .route("/simple/price", get(simple_price))
        .route("/coins/:id/market_chart", get(market_chart))
        .route("/users/:login", get(user))
        .route("/users/:login/repos", get(repos))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

// == Crypto Client Tests ==

#[tokio::test]
async fn test_prices_served_from_cache_within_ttl() {
    let stub = Arc::new(Stub::default());
    let base_url = spawn_stub(stub.clone()).await;
    let client = CryptoClient::with_base_url(ExpiringCache::default(), base_url);

    let first = client.fetch_prices().await.unwrap();
    let second = client.fetch_prices().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].id, "bitcoin");
    assert_eq!(first[0].rank, 1);
    assert_eq!(stub.price_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let stub = Arc::new(Stub::default());
    let base_url = spawn_stub(stub.clone()).await;
    let cache = ExpiringCache::default();
    let client = CryptoClient::with_base_url(cache.clone(), base_url);

    stub.fail(true);
    let err = client.fetch_prices().await.unwrap_err();
    assert_eq!(err.code(), "api.fetchCryptoPricesFailed");
    assert!(cache.is_empty());

    stub.fail(false);
    assert!(client.fetch_prices().await.is_ok());
    assert_eq!(stub.price_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_refresh_prices_bypasses_cache() {
    let stub = Arc::new(Stub::default());
    let base_url = spawn_stub(stub.clone()).await;
    let client = CryptoClient::with_base_url(ExpiringCache::default(), base_url);

    client.fetch_prices().await.unwrap();
    client.refresh_prices().await.unwrap();
    client.fetch_latest_prices().await.unwrap();

    assert_eq!(stub.price_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_fetch_latest_prices_keeps_other_entries() {
    let stub = Arc::new(Stub::default());
    let base_url = spawn_stub(stub.clone()).await;
    let client = CryptoClient::with_base_url(ExpiringCache::default(), base_url);

    client.fetch_price_history("bitcoin", 1).await.unwrap();
    client.fetch_latest_prices().await.unwrap();
    client.fetch_price_history("bitcoin", 1).await.unwrap();

    assert_eq!(stub.history_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_history_cached_per_coin_and_range() {
    let stub = Arc::new(Stub::default());
    let base_url = spawn_stub(stub.clone()).await;
    let client = CryptoClient::with_base_url(ExpiringCache::default(), base_url);

    let day = client.fetch_price_history("bitcoin", 1).await.unwrap();
    let week = client.fetch_price_history("bitcoin", 7).await.unwrap();
    client.fetch_price_history(" BITCOIN ", 1).await.unwrap();

    assert_eq!(day.prices.len(), 24);
    assert_eq!(week.prices.len(), 168);
    assert_eq!(stub.history_hits.load(Ordering::SeqCst), 2);

    let err = client.fetch_price_history("dogecoin", 7).await.unwrap_err();
    assert_eq!(err.code(), "api.fetchPriceHistoryFailed");
}

#[tokio::test]
async fn test_chart_service_samples_history() {
    let stub = Arc::new(Stub::default());
    let base_url = spawn_stub(stub.clone()).await;
    let crypto = CryptoClient::with_base_url(ExpiringCache::default(), base_url);
    let service = ChartService::new(crypto);

    let chart = service.chart("bitcoin", 30).await.unwrap();

    // 720 points sampled every 36th
    assert_eq!(chart.points.len(), 20);
    assert_eq!(chart.title, "Bitcoin Price");
    assert_eq!(chart.points[0].label, "Jan 15");
}

// == GitHub Client Tests ==

#[tokio::test]
async fn test_profile_sums_stars_and_sends_user_agent() {
    let stub = Arc::new(Stub::default());
    let base_url = spawn_stub(stub.clone()).await;
    let client = GitHubClient::with_base_url(ExpiringCache::default(), base_url);

    let profile = client.fetch_profile("OctoCat").await.unwrap();
    client.fetch_profile("octocat ").await.unwrap();

    assert_eq!(profile.user.login, "octocat");
    assert_eq!(profile.total_stars, (1..=12).sum::<u64>());
    assert_eq!(stub.user_hits.load(Ordering::SeqCst), 1);

    let agents = stub.user_agents.lock().unwrap();
    assert!(agents[0].starts_with("folio/"));

    let queries = stub.repo_queries.lock().unwrap();
    assert_eq!(queries[0].get("per_page").map(String::as_str), Some("100"));
    assert_eq!(queries[0].get("sort").map(String::as_str), Some("updated"));
}

#[tokio::test]
async fn test_repository_pages_and_has_more() {
    let stub = Arc::new(Stub::default());
    let base_url = spawn_stub(stub.clone()).await;
    let client = GitHubClient::with_base_url(ExpiringCache::default(), base_url);

    let first = client.fetch_repositories("octocat", 1).await.unwrap();
    let second = client.fetch_repositories("octocat", 2).await.unwrap();
    client.fetch_repositories("octocat", 1).await.unwrap();

    assert_eq!(first.repositories.len(), 10);
    assert!(first.has_more);
    assert_eq!(second.repositories.len(), 2);
    assert!(!second.has_more);
    assert_eq!(second.page, 2);
    assert_eq!(stub.repo_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_github_failure_code_and_no_caching() {
    let stub = Arc::new(Stub::default());
    let base_url = spawn_stub(stub.clone()).await;
    let cache = ExpiringCache::default();
    let client = GitHubClient::with_base_url(cache.clone(), base_url);

    stub.fail(true);
    let err = client.fetch_repositories("octocat", 1).await.unwrap_err();

    assert_eq!(err.code(), "api.fetchReposFailed");
    assert!(cache.is_empty());
}
