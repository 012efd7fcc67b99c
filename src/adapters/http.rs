use async_trait::async_trait;
use dedupdash_core::domain::{DuplicateGroup, NewRepo, RepoDescriptor};
use dedupdash_core::ports::{ApiFailure, ApiResult, RepositoryApi};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body shape used by the dedup server
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    description: Option<String>,
    message: Option<String>,
}

/// REST client for the dedup server's repository API
pub struct HttpRepositoryApi {
    client: Client,
    base_url: String,
}

impl HttpRepositoryApi {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn repo_url(&self, name: &str, suffix: &str) -> String {
        self.url(&format!("/repos/{}{}", urlencoding::encode(name), suffix))
    }

    /// Send and map any non-2xx or transport failure to `ApiFailure`
    async fn send(request: RequestBuilder) -> ApiResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiFailure::transport(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("API call failed with {}: {}", status, body);
        Err(ApiFailure::new(Some(status.as_u16()), failure_description(&body)))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status().as_u16();
        response
            .json::<T>()
            .await
            .map_err(|e| ApiFailure::new(Some(status), Some(format!("Invalid response: {}", e))))
    }
}

/// Server-supplied description, else its `message` field
fn failure_description(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .description
        .filter(|d| !d.trim().is_empty())
        .or(parsed.message.filter(|m| !m.trim().is_empty()))
}

#[async_trait]
impl RepositoryApi for HttpRepositoryApi {
    async fn list_repos(&self) -> ApiResult<Vec<RepoDescriptor>> {
        let response = Self::send(self.client.get(self.url("/repos"))).await?;
        Self::json(response).await
    }

    async fn create_repo(&self, repo: &NewRepo) -> ApiResult<RepoDescriptor> {
        let response = Self::send(self.client.post(self.url("/repos")).json(repo)).await?;
        Self::json(response).await
    }

    async fn delete_repo(&self, name: &str) -> ApiResult<()> {
        Self::send(self.client.delete(self.repo_url(name, ""))).await?;
        Ok(())
    }

    async fn trigger_update(&self, name: &str) -> ApiResult<()> {
        Self::send(self.client.post(self.repo_url(name, "/update"))).await?;
        Ok(())
    }

    async fn duplicates(&self, name: &str) -> ApiResult<Vec<DuplicateGroup>> {
        let response = Self::send(self.client.get(self.repo_url(name, "/dupes"))).await?;
        Self::json(response).await
    }
}
