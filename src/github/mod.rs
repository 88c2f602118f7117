use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::release::CommitEntry;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),
}

/// Source of the commits between two refs of a repository.
#[async_trait]
pub trait CompareSource: Send + Sync {
    async fn compare(&self, repository: &str, compare: &str)
        -> Result<Vec<CommitEntry>, GitHubError>;
}

/// Comparison client for the GitHub REST API.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

#[derive(Deserialize)]
struct CompareResponse {
    #[serde(default)]
    commits: Vec<CompareCommit>,
}

#[derive(Deserialize)]
struct CompareCommit {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    author: Option<CommitAuthor>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct CommitAuthor {
    #[serde(default)]
    name: String,
}

impl From<CompareCommit> for CommitEntry {
    fn from(c: CompareCommit) -> Self {
        CommitEntry::new(
            c.commit.author.map(|a| a.name).unwrap_or_default(),
            c.commit.message,
        )
    }
}

#[async_trait]
impl CompareSource for GitHubClient {
    /// GET /repos/{owner}/{repo}/compare/{base}...{head}
    ///
    /// Only the first page of commits is read.
    #[instrument(skip_all, fields(repository = %repository, compare = %compare))]
    async fn compare(
        &self,
        repository: &str,
        compare: &str,
    ) -> Result<Vec<CommitEntry>, GitHubError> {
        let url = format!("{}/repos/{}/compare/{}", self.api_url, repository, compare);

        debug!("fetching comparison from GitHub API");
        let response = self
            .client
            .get(&url)
            .header("User-Agent", "release-sheet")
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json::<CompareResponse>()
            .await?;

        let commits: Vec<CommitEntry> = response.commits.into_iter().map(Into::into).collect();
        debug!(commits = commits.len(), "received comparison");
        Ok(commits)
    }
}
