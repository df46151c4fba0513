use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::resource::Resource;
use crate::error::error_chain_fmt;
use crate::services::byte_source::ByteSource;
use crate::store::{ResourceStore, StoreError};

pub const DEFAULT_DOWNLOAD_FILENAME: &str = "download";

#[derive(thiserror::Error)]
pub enum FetchError {
    #[error("Resource not found")]
    NotFound,
    #[error("File not available")]
    FileNotAvailable,
    #[error("Failed to fetch file from storage")]
    Upstream(u16),
    #[error("Failed to fetch file from storage")]
    Storage(#[source] reqwest::Error),
    #[error("Failed to download file")]
    Store(#[source] StoreError),
}

impl FetchError {
    pub fn details(&self) -> Option<String> {
        match self {
            FetchError::Upstream(status) => Some(format!("Storage responded with status {}", status)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ResponseError for FetchError {
    fn status_code(&self) -> StatusCode {
        match self {
            FetchError::NotFound | FetchError::FileNotAvailable => StatusCode::NOT_FOUND,
            FetchError::Upstream(_) | FetchError::Storage(_) => StatusCode::BAD_GATEWAY,
            FetchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            details: self.details(),
        })
    }
}

#[derive(Debug)]
pub struct DownloadPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

impl DownloadPayload {
    pub fn content_length(&self) -> usize {
        self.bytes.len()
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Resolves downloadable resources, trying each byte source in order.
pub struct ResourceFetcher {
    store: Arc<dyn ResourceStore>,
    sources: Vec<Box<dyn ByteSource>>,
}

impl ResourceFetcher {
    pub fn new(store: Arc<dyn ResourceStore>, sources: Vec<Box<dyn ByteSource>>) -> Self {
        Self { store, sources }
    }

    #[tracing::instrument(name = "Fetch the bytes of a resource", skip(self))]
    pub async fn fetch(
        &self,
        resource_id: &str,
        requested_filename: &str,
    ) -> Result<DownloadPayload, FetchError> {
        let id = Uuid::parse_str(resource_id).map_err(|_| FetchError::NotFound)?;
        let resource = self
            .store
            .find_by_id(id)
            .await
            .map_err(|err| {
                tracing::error!(error.cause_chain = ?err, "Failed to look up the resource");
                FetchError::Store(err)
            })?
            .ok_or(FetchError::NotFound)?;

        let bytes = self.read_bytes(&resource).await?;

        self.record_download(resource.id);

        Ok(DownloadPayload {
            bytes,
            content_type: resource.content_type(),
            filename: resource.download_filename(requested_filename),
        })
    }

    async fn read_bytes(&self, resource: &Resource) -> Result<Vec<u8>, FetchError> {
        for source in &self.sources {
            match source.read(resource).await {
                Ok(Some(bytes)) => {
                    tracing::debug!(source = source.name(), "Resource bytes resolved");
                    return Ok(bytes);
                }
                Ok(None) => continue,
                Err(err) => {
                    tracing::error!(
                        source = source.name(),
                        error.cause_chain = ?err,
                        "Failed to read the resource"
                    );
                    return Err(err);
                }
            }
        }

        Err(FetchError::FileNotAvailable)
    }

    /// The counter is updated in a detached task: the response never waits for it.
    fn record_download(&self, id: Uuid) {
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            if let Err(err) = store.increment_download_count(id).await {
                tracing::warn!(
                    resource_id = %id,
                    error.cause_chain = ?err,
                    "Failed to increment the download count"
                );
            }
        });
    }
}
