use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::resource::Resource;
use crate::domain::subscriber::{Subscriber, SubscriberChanges};
use crate::domain::subscriber_email::SubscriberEmail;
use crate::error::error_chain_fmt;

#[cfg(any(test, feature = "in-memory-store"))]
pub mod in_memory;
pub mod postgres;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("The database query failed.")]
    Database(#[from] sqlx::Error),
    #[error("Stored record is corrupt: {0}")]
    CorruptRecord(String),
    #[error("The store is unavailable.")]
    Unavailable,
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Newsletter subscribers, keyed by their normalized email.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn find_by_email(&self, email: &SubscriberEmail)
        -> Result<Option<Subscriber>, StoreError>;

    async fn create(&self, new_subscriber: &NewSubscriber) -> Result<(), StoreError>;

    async fn update(&self, id: Uuid, changes: SubscriberChanges) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>, StoreError>;

    async fn increment_download_count(&self, id: Uuid) -> Result<(), StoreError>;
}
