use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContribError>;

#[derive(Error, Debug)]
pub enum ContribError {
    #[error("GitHub API error: {0}")]
    Api(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed log record in {repo}:\n---\n{block}\n---")]
    MalformedLog { repo: String, block: String },
    #[error("Repository mirror not found: {}", .0.display())]
    MirrorMissing(PathBuf),
    #[error("`{command}` exited with {code:?}: {stderr}")]
    Subprocess {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("{stage} failed for {} task(s): {}", .failures.len(), .failures.join("; "))]
    Tasks { stage: String, failures: Vec<String> },
    #[error("Git error: {0}")]
    Git(#[from] Box<gix::open::Error>),
    #[error("Other: {0}")]
    Other(String),
}

impl From<gix::open::Error> for ContribError {
    fn from(err: gix::open::Error) -> Self {
        ContribError::Git(Box::new(err))
    }
}

impl From<tokio::task::JoinError> for ContribError {
    fn from(err: tokio::task::JoinError) -> Self {
        ContribError::Other(format!("task aborted: {err}"))
    }
}
