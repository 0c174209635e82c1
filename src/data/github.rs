//! GitHub REST API client
//!
//! Fetches a user's public profile (with a star total across their repositories)
//! and paginated repository lists. Usernames are normalized and validated before
//! any cache lookup or request.

use reqwest::header::USER_AGENT as USER_AGENT_HEADER;
use reqwest::Client;
use thiserror::Error;

use super::{
    sanitize_username, send_json, validate_username, FetchError, GitHubProfile, GitHubRepo,
    GitHubUser, RepositoryPage, ValidationError,
};
use crate::cache::{keys, ExpiringCache};

/// Base URL for the GitHub API
pub const GITHUB_BASE_URL: &str = "https://api.github.com";

/// GitHub rejects requests without a User-Agent
const USER_AGENT: &str = concat!("folio/", env!("CARGO_PKG_VERSION"));

/// Repositories shown per page
pub const REPOS_PER_PAGE: u32 = 10;

/// Repositories summed for the star total; larger accounts get an approximation
const STARS_SAMPLE_SIZE: u32 = 100;

/// Errors that can occur when fetching GitHub data
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Username failed validation; no request was made
    #[error("Invalid username: {0}")]
    Validation(#[from] ValidationError),

    /// Profile request failed
    #[error("Failed to fetch user: {0}")]
    User(#[source] FetchError),

    /// Repository list request failed
    #[error("Failed to fetch repositories: {0}")]
    Repos(#[source] FetchError),
}

impl GitHubError {
    /// Stable error code for display layers
    pub fn code(&self) -> &'static str {
        match self {
            GitHubError::Validation(e) => e.code(),
            GitHubError::User(_) => "api.fetchUserFailed",
            GitHubError::Repos(_) => "api.fetchReposFailed",
        }
    }
}

/// Client for the GitHub users and repositories endpoints
#[derive(Debug, Clone)]
pub struct GitHubClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Shared response cache
    cache: ExpiringCache,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl GitHubClient {
    /// Creates a client against the public GitHub API
    pub fn new(cache: ExpiringCache) -> Self {
        Self::with_base_url(cache, GITHUB_BASE_URL)
    }

    /// Creates a client against a custom base URL
    pub fn with_base_url(cache: ExpiringCache, base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            cache,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches a profile and the user's total stars
    ///
    /// # Arguments
    /// * `username` - GitHub login; trimmed and lowercased before use
    ///
    /// # Returns
    /// * `Ok(GitHubProfile)` - From cache if fresh, otherwise from two concurrent requests
    /// * `Err(GitHubError::Validation)` - If the username breaks GitHub's rules
    pub async fn fetch_profile(&self, username: &str) -> Result<GitHubProfile, GitHubError> {
        let login = sanitize_username(username);
        validate_username(&login)?;

        let cache_key = keys::github_user(&login);
        if let Some(cached) = self.cache.get::<GitHubProfile>(&cache_key) {
            tracing::debug!(key = %cache_key, "cache hit");
            return Ok(cached);
        }

        let (user, total_stars) =
            futures::try_join!(self.fetch_user(&login), self.fetch_total_stars(&login))?;

        let profile = GitHubProfile { user, total_stars };
        self.cache.set(&cache_key, &profile);
        tracing::info!(login = %login, total_stars, "fetched GitHub profile");
        Ok(profile)
    }

    /// Fetches one page of a user's repositories, most recently updated first
    ///
    /// # Arguments
    /// * `username` - GitHub login; trimmed and lowercased before use
    /// * `page` - 1-based page number; 0 is treated as 1
    pub async fn fetch_repositories(
        &self,
        username: &str,
        page: u32,
    ) -> Result<RepositoryPage, GitHubError> {
        let login = sanitize_username(username);
        validate_username(&login)?;
        let page = page.max(1);

        let cache_key = keys::github_repos(&login, page);
        if let Some(cached) = self.cache.get::<RepositoryPage>(&cache_key) {
            tracing::debug!(key = %cache_key, "cache hit");
            return Ok(cached);
        }

        let repositories = self.list_repos(&login, page, REPOS_PER_PAGE).await?;
        let result = RepositoryPage {
            has_more: repositories.len() == REPOS_PER_PAGE as usize,
            repositories,
            page,
        };

        self.cache.set(&cache_key, &result);
        Ok(result)
    }

    /// GET request carrying the User-Agent GitHub requires
    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http_client.get(url).header(USER_AGENT_HEADER, USER_AGENT)
    }

    async fn fetch_user(&self, login: &str) -> Result<GitHubUser, GitHubError> {
        let url = format!("{}/users/{}", self.base_url, login);
        let user: GitHubUser = send_json(self.get(&url))
            .await
            .map_err(GitHubError::User)?;

        if user.login.is_empty() {
            return Err(GitHubError::User(FetchError::MissingData(
                "login".to_string(),
            )));
        }
        Ok(user)
    }

    async fn fetch_total_stars(&self, login: &str) -> Result<u64, GitHubError> {
        let repos = self.list_repos(login, 1, STARS_SAMPLE_SIZE).await?;
        Ok(total_stars(&repos))
    }

    async fn list_repos(
        &self,
        login: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<GitHubRepo>, GitHubError> {
        let url = format!("{}/users/{}/repos", self.base_url, login);
        let query = [
            ("sort", "updated".to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];

        send_json(self.get(&url).query(&query))
            .await
            .map_err(GitHubError::Repos)
    }
}

/// Sums stargazers across repositories
pub fn total_stars(repos: &[GitHubRepo]) -> u64 {
    repos.iter().map(|r| r.stargazers_count).sum()
}
