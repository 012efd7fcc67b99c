use async_trait::async_trait;
use thiserror::Error;

use crate::domain::repo::{DuplicateGroup, NewRepo, RepoDescriptor};

/// A failed collaborator call
#[derive(Error, Debug, Clone, Default, PartialEq)]
#[error("{}", describe(.status, .description, .cause))]
pub struct ApiFailure {
    /// HTTP status, when a response arrived at all
    pub status: Option<u16>,
    /// Description supplied by the server
    pub description: Option<String>,
    /// Transport-level error when no usable response arrived
    pub cause: Option<String>,
}

impl ApiFailure {
    pub fn new(status: Option<u16>, description: Option<String>) -> Self {
        Self {
            status,
            description,
            cause: None,
        }
    }

    /// Request never produced a response (refused, timed out, TLS, ...)
    pub fn transport(status: Option<u16>, cause: impl Into<String>) -> Self {
        Self {
            status,
            description: None,
            cause: Some(cause.into()),
        }
    }

    /// The message to show: the server's description, else `fallback`
    pub fn message_or(&self, fallback: &str) -> String {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

fn describe(status: &Option<u16>, description: &Option<String>, cause: &Option<String>) -> String {
    let mut text = match (status, description) {
        (Some(status), Some(desc)) => format!("{} ({})", desc, status),
        (Some(status), None) => format!("status {}", status),
        (None, Some(desc)) => desc.clone(),
        (None, None) => "request failed".to_string(),
    };
    if let Some(cause) = cause {
        text.push_str(": ");
        text.push_str(cause);
    }
    text
}

pub type ApiResult<T> = std::result::Result<T, ApiFailure>;

/// Port for the dedup server's request/response API
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    async fn list_repos(&self) -> ApiResult<Vec<RepoDescriptor>>;

    async fn create_repo(&self, repo: &NewRepo) -> ApiResult<RepoDescriptor>;

    async fn delete_repo(&self, name: &str) -> ApiResult<()>;

    /// Success only means background work started; completion arrives on the push channel
    async fn trigger_update(&self, name: &str) -> ApiResult<()>;

    async fn duplicates(&self, name: &str) -> ApiResult<Vec<DuplicateGroup>>;
}
