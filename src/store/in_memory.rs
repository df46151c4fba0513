//! Store implementations kept in process memory. They count the calls they receive and can be
//! told to fail, so handlers can be exercised without a database.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::resource::Resource;
use crate::domain::subscriber::{Subscriber, SubscriberChanges};
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_status::SubscriberStatus;
use crate::store::{ResourceStore, StoreError, SubscriberStore};

#[derive(Default)]
pub struct InMemorySubscriberStore {
    subscribers: Mutex<Vec<Subscriber>>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
    failing_updates: AtomicBool,
}

impl InMemorySubscriberStore {
    pub fn with_subscribers(subscribers: Vec<Subscriber>) -> Self {
        Self {
            subscribers: Mutex::new(subscribers),
            ..Default::default()
        }
    }

    /// Number of store operations received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_failing_updates(&self, failing: bool) {
        self.failing_updates.store(failing, Ordering::SeqCst);
    }

    pub async fn subscribers(&self) -> Vec<Subscriber> {
        self.subscribers.lock().await.clone()
    }

    fn record_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        self.record_call()?;
        let subscribers = self.subscribers.lock().await;

        Ok(subscribers
            .iter()
            .find(|subscriber| subscriber.email == *email)
            .cloned())
    }

    async fn create(&self, new_subscriber: &NewSubscriber) -> Result<(), StoreError> {
        self.record_call()?;
        let mut subscribers = self.subscribers.lock().await;

        if subscribers
            .iter()
            .any(|subscriber| subscriber.email == new_subscriber.email)
        {
            return Err(StoreError::CorruptRecord(format!(
                "duplicate subscriber email {}",
                new_subscriber.email
            )));
        }

        subscribers.push(Subscriber {
            id: Uuid::new_v4(),
            email: new_subscriber.email.clone(),
            name: new_subscriber.name.clone(),
            status: SubscriberStatus::Active,
            source: new_subscriber.source.clone(),
            subscribed_at: new_subscriber.subscribed_at,
            welcome_email_sent: false,
        });

        Ok(())
    }

    async fn update(&self, id: Uuid, changes: SubscriberChanges) -> Result<(), StoreError> {
        self.record_call()?;
        if self.failing_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        let mut subscribers = self.subscribers.lock().await;

        if let Some(subscriber) = subscribers.iter_mut().find(|subscriber| subscriber.id == id) {
            changes.apply_to(subscriber);
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryResourceStore {
    resources: Mutex<HashMap<Uuid, Resource>>,
    failing_increments: AtomicBool,
}

impl InMemoryResourceStore {
    pub async fn insert(&self, resource: Resource) {
        self.resources.lock().await.insert(resource.id, resource);
    }

    pub fn set_failing_increments(&self, failing: bool) {
        self.failing_increments.store(failing, Ordering::SeqCst);
    }

    pub async fn download_count(&self, id: Uuid) -> Option<i64> {
        self.resources
            .lock()
            .await
            .get(&id)
            .map(|resource| resource.download_count)
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>, StoreError> {
        Ok(self.resources.lock().await.get(&id).cloned())
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<(), StoreError> {
        if self.failing_increments.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        if let Some(resource) = self.resources.lock().await.get_mut(&id) {
            resource.download_count += 1;
        }

        Ok(())
    }
}
