//! GitHub repository metadata client.
//!
//! Read-only: repository details, language byte counts, and individual file
//! contents, which is everything prompt assembly needs. Details and languages
//! are fetched concurrently. No retry wrapping here — the public GitHub API
//! is called bare, and only the generation proxy exhibits throttling churn.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const NO_DESCRIPTION: &str = "No description provided.";

/// Errors from the GitHub API surface.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("not a valid GitHub repository URL: {0}")]
    InvalidUrl(String),
    #[error("GitHub API request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("file content was not valid base64: {0}")]
    ContentDecode(#[from] base64::DecodeError),
    #[error("file content was not valid UTF-8: {0}")]
    ContentEncoding(#[from] std::string::FromUtf8Error),
}

/// An `owner/repo` pair parsed from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse `https://github.com/{owner}/{repo}`, tolerating a trailing
    /// `.git` and extra path segments. Anything else is rejected.
    pub fn parse(url: &str) -> Result<Self, GithubError> {
        let invalid = || GithubError::InvalidUrl(url.to_string());
        let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;
        if parsed.host_str() != Some("github.com") {
            return Err(invalid());
        }
        let mut segments = parsed.path_segments().ok_or_else(invalid)?.filter(|s| !s.is_empty());
        let owner = segments.next().ok_or_else(invalid)?.to_string();
        let repo = segments.next().ok_or_else(invalid)?.trim_end_matches(".git").to_string();
        if repo.is_empty() {
            return Err(invalid());
        }
        Ok(Self { owner, repo })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Repository details merged with the language byte counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub name: String,
    /// Repository description, defaulted when the owner left it blank.
    pub description: String,
    pub primary_language: Option<String>,
    /// Language name to byte count, largest-to-smallest not guaranteed;
    /// ordered by name for stable output.
    pub languages: BTreeMap<String, u64>,
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
struct RepoDetails {
    name: String,
    description: Option<String>,
    language: Option<String>,
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    content: Option<String>,
}

/// Read-only client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    pub fn new() -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("repomuse/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url: DEFAULT_BASE_URL.to_string() })
    }

    /// Point at a different API root (GitHub Enterprise, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Repository details and language breakdown, fetched concurrently.
    pub async fn repo_info(&self, repo: &RepoRef) -> Result<RepoInfo, GithubError> {
        let details_url = format!("{}/repos/{}/{}", self.base_url, repo.owner, repo.repo);
        let languages_url = format!("{}/languages", details_url);

        let (details, languages) = futures::try_join!(
            self.get_json::<RepoDetails>(&details_url),
            self.get_json::<BTreeMap<String, u64>>(&languages_url),
        )?;

        Ok(RepoInfo {
            name: details.name,
            description: details.description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            primary_language: details.language,
            languages,
            default_branch: details.default_branch,
        })
    }

    /// Decoded content of one file, or `None` when the path does not exist.
    pub async fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
    ) -> Result<Option<String>, GithubError> {
        let url =
            format!("{}/repos/{}/{}/contents/{}", self.base_url, repo.owner, repo.repo, path);
        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::warn!(%repo, path, "file not found in repository");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let entry: ContentEntry = response.json().await?;
        let Some(encoded) = entry.content else {
            return Ok(None);
        };
        // GitHub wraps base64 content with newlines; strip before decoding.
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64.decode(compact.as_bytes())?;
        Ok(Some(String::from_utf8(bytes)?))
    }

    async fn get_json<T>(&self, url: &str) -> Result<T, GithubError>
    where
        T: DeserializeOwned,
    {
        tracing::debug!(url, "GitHub API request");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }
        Ok(response.json().await?)
    }
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> GithubError {
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body
    };
    GithubError::Status { status: status.as_u16(), message }
}
