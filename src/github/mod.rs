//! GitHub repository listing
//!
//! Thin client over the GitHub REST API used to enumerate a user's
//! repositories as scan targets. An optional token from
//! `REPOSCAN_GITHUB_TOKEN` raises the rate limit; everything works
//! unauthenticated too.

use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "reposcan";
pub const TOKEN_ENV_VAR: &str = "REPOSCAN_GITHUB_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("user '{0}' not found")]
    UserNotFound(String),
    #[error("GitHub API rate limit exceeded")]
    RateLimited,
    #[error("GitHub API error (status {0})")]
    Api(u16),
    #[error("GitHub API unavailable: {0}")]
    Http(#[from] reqwest::Error),
}

/// Repository as presented to scan consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    /// Clone URL, the natural input to a scan
    pub url: String,
    pub html: String,
    pub language: Option<String>,
    pub stars: u64,
    pub description: Option<String>,
    pub updated_at: Option<String>,
    pub size: u64,
}

/// Raw shape of the API response rows
#[derive(Debug, Deserialize)]
struct ApiRepo {
    name: String,
    clone_url: String,
    html_url: String,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    description: Option<String>,
    updated_at: Option<String>,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    fork: bool,
}

impl From<ApiRepo> for RepoInfo {
    fn from(repo: ApiRepo) -> Self {
        Self {
            name: repo.name,
            url: repo.clone_url,
            html: repo.html_url,
            language: repo.language,
            stars: repo.stargazers_count,
            description: repo.description,
            updated_at: repo.updated_at,
            size: repo.size,
        }
    }
}

pub struct GithubClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl GithubClient {
    /// Client with the token, if any, taken from the environment
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            token: std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()),
        }
    }

    /// List a user's repositories, newest first by the requested sort
    pub async fn list_user_repos(
        &self,
        username: &str,
        per_page: u32,
        sort: &str,
        include_forks: bool,
    ) -> Result<Vec<RepoInfo>, GithubError> {
        let url = format!("{}/users/{}/repos", API_BASE, username);
        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("per_page", per_page.min(100).to_string()),
                ("sort", sort.to_string()),
                ("direction", "desc".to_string()),
            ])
            .timeout(std::time::Duration::from_secs(10));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status().as_u16() {
            200 => {}
            404 => return Err(GithubError::UserNotFound(username.to_string())),
            403 => return Err(GithubError::RateLimited),
            status => return Err(GithubError::Api(status)),
        }

        let repos: Vec<ApiRepo> = response.json().await?;
        let count = repos.len();
        let results: Vec<RepoInfo> = repos
            .into_iter()
            .filter(|r| include_forks || !r.fork)
            .map(RepoInfo::from)
            .collect();
        log::info!(
            "Fetched {} repositories for user '{}' ({} after fork filter)",
            count,
            username,
            results.len()
        );
        Ok(results)
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SAMPLE: &str = r#"[
        {
            "name": "widget",
            "clone_url": "https://github.com/acme/widget.git",
            "html_url": "https://github.com/acme/widget",
            "language": "Rust",
            "stargazers_count": 42,
            "description": "a widget",
            "updated_at": "2025-06-01T12:00:00Z",
            "size": 1280,
            "fork": false
        },
        {
            "name": "forked-thing",
            "clone_url": "https://github.com/acme/forked-thing.git",
            "html_url": "https://github.com/acme/forked-thing",
            "language": null,
            "fork": true
        }
    ]"#;

    #[test]
    fn test_api_rows_map_to_repo_info() {
        let rows: Vec<ApiRepo> = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(rows.len(), 2);
        let info: RepoInfo = rows.into_iter().next().unwrap().into();
        assert_eq!(info.name, "widget");
        assert_eq!(info.url, "https://github.com/acme/widget.git");
        assert_eq!(info.stars, 42);
        assert_eq!(info.language.as_deref(), Some("Rust"));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let rows: Vec<ApiRepo> = serde_json::from_str(SAMPLE).unwrap();
        let fork = &rows[1];
        assert!(fork.fork);
        assert_eq!(fork.stargazers_count, 0);
        assert_eq!(fork.size, 0);
        assert!(fork.language.is_none());
    }

    #[test]
    #[serial]
    fn test_token_read_from_environment() {
        std::env::set_var(TOKEN_ENV_VAR, "ghx_sometoken");
        let client = GithubClient::new();
        assert_eq!(client.token.as_deref(), Some("ghx_sometoken"));

        std::env::set_var(TOKEN_ENV_VAR, "");
        let client = GithubClient::new();
        assert!(client.token.is_none());

        std::env::remove_var(TOKEN_ENV_VAR);
        let client = GithubClient::new();
        assert!(client.token.is_none());
    }
}
