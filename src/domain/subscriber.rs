use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::subscriber_status::SubscriberStatus;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: SubscriberEmail,
    pub name: Option<SubscriberName>,
    pub status: SubscriberStatus,
    pub source: String,
    pub subscribed_at: DateTime<Utc>,
    pub welcome_email_sent: bool,
}

/// Partial update of a subscriber record. Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct SubscriberChanges {
    pub status: Option<SubscriberStatus>,
    pub name: Option<SubscriberName>,
    pub subscribed_at: Option<DateTime<Utc>>,
    pub welcome_email_sent: Option<bool>,
}

impl SubscriberChanges {
    pub fn reactivate(name: Option<SubscriberName>) -> Self {
        Self {
            status: Some(SubscriberStatus::Active),
            name,
            subscribed_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn unsubscribe() -> Self {
        Self {
            status: Some(SubscriberStatus::Unsubscribed),
            ..Default::default()
        }
    }

    pub fn welcome_email_sent() -> Self {
        Self {
            welcome_email_sent: Some(true),
            ..Default::default()
        }
    }

    pub fn apply_to(self, subscriber: &mut Subscriber) {
        if let Some(status) = self.status {
            subscriber.status = status;
        }
        if let Some(name) = self.name {
            subscriber.name = Some(name);
        }
        if let Some(subscribed_at) = self.subscribed_at {
            subscriber.subscribed_at = subscribed_at;
        }
        if let Some(welcome_email_sent) = self.welcome_email_sent {
            subscriber.welcome_email_sent = welcome_email_sent;
        }
    }
}
