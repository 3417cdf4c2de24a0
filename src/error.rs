use thiserror::Error;

use crate::models::ConfigError;

/// Main error type for lab
#[derive(Error, Debug)]
pub enum LabError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("GitLab error: {0}")]
    GitLab(#[from] GitLabError),

    #[error("{name} is not a remote")]
    NotARemote { name: String },

    #[error("failed to find job: {0}")]
    JobNotFound(GitLabError),

    #[error("Failed to read job trace: {0}")]
    TraceRead(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the local git wrapper
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Not on a branch (detached HEAD)")]
    DetachedHead,

    #[error("Cannot determine project path from remote URL: {0}")]
    UnsupportedRemoteUrl(String),
}

/// Errors related to the GitLab API
#[derive(Error, Debug)]
pub enum GitLabError {
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid GitLab host: {0}")]
    InvalidHost(String),

    #[error("No pipeline found for branch {0}")]
    NoPipeline(String),

    #[error("Pipeline #{0} has no jobs")]
    NoJobs(u64),
}

/// Connect and timeout failures are mapped by the client, which knows the
/// host and the configured timeout
impl From<reqwest::Error> for GitLabError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            GitLabError::HttpError {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            GitLabError::ParseError(err.to_string())
        } else {
            GitLabError::RequestFailed(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, LabError>;
