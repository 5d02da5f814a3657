//! Where documentation is fetched from

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::error::{AggregateError, Result};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";
const USER_AGENT: &str = "amiable-templates-aggregator/1.0";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// A host of template repositories
///
/// Failures are reported as `None` after logging; aggregation of one
/// entry must never abort the others.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Current head commit of `owner/repo`
    async fn head_revision(&self, owner: &str, repo: &str) -> Option<String>;

    /// Contents of `path` at `revision`
    async fn fetch_file(&self, owner: &str, repo: &str, revision: &str, path: &str)
    -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
}

/// GitHub REST and raw-content client with bounded concurrency
#[derive(Debug)]
pub struct GitHubSource {
    client: reqwest::Client,
    token: Option<String>,
    permits: Semaphore,
    api_base: String,
    raw_base: String,
}

impl GitHubSource {
    pub fn new(token: Option<String>, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(AggregateError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            token,
            permits: Semaphore::new(concurrency),
            api_base: GITHUB_API_BASE.to_string(),
            raw_base: GITHUB_RAW_BASE.to_string(),
        })
    }

    /// Point at another API/raw host, e.g. GitHub Enterprise
    pub fn with_base_urls(mut self, api_base: impl Into<String>, raw_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.raw_base = raw_base.into().trim_end_matches('/').to_string();
        self
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, url: &str) -> Option<reqwest::Response> {
        match self.get(url).send().await {
            Ok(response) => Some(response),
            Err(err) => {
                error!(url, error = %err, "request failed");
                None
            }
        }
    }
}

#[async_trait]
impl RepositorySource for GitHubSource {
    async fn head_revision(&self, owner: &str, repo: &str) -> Option<String> {
        let url = format!("{}/repos/{owner}/{repo}/commits/HEAD", self.api_base);
        let _permit = self.permits.acquire().await.ok()?;
        let response = self.send(&url).await?;
        if !response.status().is_success() {
            error!(repo = %format!("{owner}/{repo}"), status = %response.status(), "failed to get commit SHA");
            return None;
        }
        match response.json::<CommitResponse>().await {
            Ok(commit) => {
                debug!(repo = %format!("{owner}/{repo}"), sha = %commit.sha, "resolved head revision");
                Some(commit.sha)
            }
            Err(err) => {
                error!(repo = %format!("{owner}/{repo}"), error = %err, "unexpected commit response");
                None
            }
        }
    }

    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        revision: &str,
        path: &str,
    ) -> Option<String> {
        let url = format!("{}/{owner}/{repo}/{revision}/{path}", self.raw_base);
        let _permit = self.permits.acquire().await.ok()?;
        let response = self.send(&url).await?;
        if !response.status().is_success() {
            warn!(repo = %format!("{owner}/{repo}"), path, status = %response.status(), "failed to fetch file");
            return None;
        }
        match response.text().await {
            Ok(text) => Some(text),
            Err(err) => {
                error!(repo = %format!("{owner}/{repo}"), path, error = %err, "failed to read file body");
                None
            }
        }
    }
}
