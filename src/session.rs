//! Session context for one user's workflow.
//!
//! Owns what the tool's UI shell needs to remember between operations — the
//! selected repository and the current README markdown — plus handles to both
//! clients. Nothing here is shared: one session, one owner. Every remote call
//! is one call sequence whose terminal error reaches the caller exactly once.

use crate::api::{AiClient, ApiError, GeneratedImage};
use crate::github::{GithubClient, GithubError, RepoRef};
use crate::{prompt, CallError};
use thiserror::Error;

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no repository selected")]
    NoRepoSelected,
    #[error("no README has been generated yet")]
    NoReadme,
    #[error("required input is missing: {0}")]
    MissingInput(&'static str),
    #[error("file not found in repository: {0}")]
    FileUnavailable(String),
    #[error(transparent)]
    Github(#[from] GithubError),
    #[error(transparent)]
    Generation(#[from] CallError<ApiError>),
}

/// One user's working context.
#[derive(Debug, Clone)]
pub struct Session {
    ai: AiClient,
    github: GithubClient,
    repo: Option<RepoRef>,
    readme: Option<String>,
}

impl Session {
    pub fn new(ai: AiClient, github: GithubClient) -> Self {
        Self { ai, github, repo: None, readme: None }
    }

    /// Parse and select the repository every later operation targets.
    pub fn select_repo(&mut self, url: &str) -> Result<&RepoRef, SessionError> {
        let repo = RepoRef::parse(url)?;
        tracing::debug!(%repo, "repository selected");
        Ok(self.repo.insert(repo))
    }

    pub fn repo(&self) -> Option<&RepoRef> {
        self.repo.as_ref()
    }

    /// The most recently generated README markdown, if any.
    pub fn readme_markdown(&self) -> Option<&str> {
        self.readme.as_deref()
    }

    /// Fetch repository metadata and generate a fresh README from it.
    pub async fn generate_readme(&mut self) -> Result<&str, SessionError> {
        let repo = self.repo.as_ref().ok_or(SessionError::NoRepoSelected)?;
        let info = self.github.repo_info(repo).await?;
        let markdown = self.ai.generate_text(&prompt::readme(&info)).await?;
        Ok(self.readme.insert(markdown))
    }

    /// Regenerate the current README under a user instruction.
    pub async fn improve_readme(&mut self, instruction: &str) -> Result<&str, SessionError> {
        if instruction.trim().is_empty() {
            return Err(SessionError::MissingInput("an improvement instruction"));
        }
        let current = self.readme.as_deref().ok_or(SessionError::NoReadme)?;
        let markdown =
            self.ai.generate_text(&prompt::improve_readme(current, instruction)).await?;
        Ok(self.readme.insert(markdown))
    }

    /// Commit-message suggestions for the current README, one per line with
    /// list dashes stripped.
    pub async fn suggest_commits(&self) -> Result<Vec<String>, SessionError> {
        let readme = self.readme.as_deref().ok_or(SessionError::NoReadme)?;
        let raw = self.ai.generate_text(&prompt::commit_suggestions(readme)).await?;
        Ok(raw
            .lines()
            .map(|line| line.trim().trim_start_matches('-').trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Fetch one file from the selected repository and explain it.
    pub async fn explain_file(&self, path: &str) -> Result<String, SessionError> {
        let repo = self.repo.as_ref().ok_or(SessionError::NoRepoSelected)?;
        let code = self
            .github
            .file_content(repo, path)
            .await?
            .ok_or_else(|| SessionError::FileUnavailable(path.to_string()))?;
        Ok(self.ai.generate_text(&prompt::explain_code(path, &code)).await?)
    }

    /// Refactor caller-supplied code under an instruction.
    pub async fn refactor_code(
        &self,
        path: &str,
        code: &str,
        instruction: &str,
    ) -> Result<String, SessionError> {
        if code.trim().is_empty() {
            return Err(SessionError::MissingInput("code to refactor"));
        }
        if instruction.trim().is_empty() {
            return Err(SessionError::MissingInput("a refactoring instruction"));
        }
        Ok(self.ai.generate_text(&prompt::refactor(path, code, instruction)).await?)
    }

    /// Generate code from a free-form description.
    pub async fn generate_code(
        &self,
        description: &str,
        language: Option<&str>,
    ) -> Result<String, SessionError> {
        if description.trim().is_empty() {
            return Err(SessionError::MissingInput("a description of the code"));
        }
        Ok(self
            .ai
            .generate_text(&prompt::generate_code(description, language, false))
            .await?)
    }

    /// Generate an image from a free-form description.
    pub async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, SessionError> {
        if prompt.trim().is_empty() {
            return Err(SessionError::MissingInput("an image description"));
        }
        Ok(self.ai.generate_image(prompt).await?)
    }
}
