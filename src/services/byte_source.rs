use async_trait::async_trait;
use reqwest::Client;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::resource::Resource;
use crate::services::resource_fetcher::FetchError;

/// One place a resource's bytes may live. `Ok(None)` means "not here, try the next source".
#[async_trait]
pub trait ByteSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn read(&self, resource: &Resource) -> Result<Option<Vec<u8>>, FetchError>;
}

/// Files uploaded through the content backend, stored under the media directory.
pub struct LocalFileSource {
    directory: PathBuf,
}

impl LocalFileSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl ByteSource for LocalFileSource {
    fn name(&self) -> &'static str {
        "local file"
    }

    async fn read(&self, resource: &Resource) -> Result<Option<Vec<u8>>, FetchError> {
        // Only the final path component is honoured so a stored name cannot escape the directory.
        let file_name = match resource.local_filename().and_then(|name| Path::new(name).file_name()) {
            Some(file_name) => file_name,
            None => return Ok(None),
        };
        let path = self.directory.join(file_name);

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to read the local copy of a resource"
                );
                Ok(None)
            }
        }
    }
}

/// The CDN copy referenced by the resource's remote URL.
pub struct RemoteSource {
    http_client: Client,
}

impl RemoteSource {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ByteSource for RemoteSource {
    fn name(&self) -> &'static str {
        "remote storage"
    }

    async fn read(&self, resource: &Resource) -> Result<Option<Vec<u8>>, FetchError> {
        let url = match resource.remote_url() {
            Some(url) => url,
            None => return Ok(None),
        };

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Storage)?;

        if !response.status().is_success() {
            return Err(FetchError::Upstream(response.status().as_u16()));
        }

        let bytes = response.bytes().await.map_err(FetchError::Storage)?;

        Ok(Some(bytes.to_vec()))
    }
}
