use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::sync::Arc;

use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::subscriber::SubscriberChanges;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::error::error_chain_fmt;
use crate::notifications::WelcomeNotifier;
use crate::store::{StoreError, SubscriberStore};

/// Wire shape of every subscription operation, successful or not.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    Subscribed,
    AlreadySubscribed,
    Reactivated,
    Unsubscribed,
}

impl SubscriptionOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SubscriptionOutcome::Subscribed => {
                "Thank you for subscribing! Check your inbox for a welcome email."
            }
            SubscriptionOutcome::AlreadySubscribed => {
                "You are already subscribed to our newsletter."
            }
            SubscriptionOutcome::Reactivated => {
                "Welcome back! Your subscription has been reactivated."
            }
            SubscriptionOutcome::Unsubscribed => {
                "You have been unsubscribed from our newsletter."
            }
        }
    }
}

impl From<SubscriptionOutcome> for ActionResult {
    fn from(outcome: SubscriptionOutcome) -> Self {
        ActionResult {
            success: true,
            message: String::from(outcome.message()),
        }
    }
}

#[derive(thiserror::Error)]
pub enum SubscriptionError {
    #[error("{0}")]
    Validation(String),
    #[error("Email not found in our subscriber list.")]
    NotFound,
    #[error("Something went wrong. Please try again later.")]
    Unexpected(#[source] StoreError),
}

impl std::fmt::Debug for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<&SubscriptionError> for ActionResult {
    fn from(err: &SubscriptionError) -> Self {
        ActionResult {
            success: false,
            message: err.to_string(),
        }
    }
}

impl ResponseError for SubscriptionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionError::Validation(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::NotFound => StatusCode::NOT_FOUND,
            SubscriptionError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ActionResult::from(self))
    }
}

pub struct SubscriptionManager {
    store: Arc<dyn SubscriberStore>,
    notifier: Arc<dyn WelcomeNotifier>,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn SubscriberStore>, notifier: Arc<dyn WelcomeNotifier>) -> Self {
        Self { store, notifier }
    }

    #[tracing::instrument(name = "Subscribe to the newsletter", skip(self, name))]
    pub async fn subscribe(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<SubscriptionOutcome, SubscriptionError> {
        let new_subscriber =
            NewSubscriber::parse(email, name).map_err(SubscriptionError::Validation)?;

        self.activate(new_subscriber).await.map_err(log_unexpected)
    }

    #[tracing::instrument(name = "Unsubscribe from the newsletter", skip(self))]
    pub async fn unsubscribe(&self, email: &str) -> Result<SubscriptionOutcome, SubscriptionError> {
        let email = SubscriberEmail::parse(email).map_err(SubscriptionError::Validation)?;

        self.deactivate(&email).await.map_err(log_unexpected)
    }

    async fn activate(
        &self,
        new_subscriber: NewSubscriber,
    ) -> Result<SubscriptionOutcome, SubscriptionError> {
        let existing = self
            .store
            .find_by_email(&new_subscriber.email)
            .await
            .map_err(SubscriptionError::Unexpected)?;

        match existing {
            Some(subscriber) if subscriber.status.is_active() => {
                Ok(SubscriptionOutcome::AlreadySubscribed)
            }
            Some(subscriber) => {
                let name = new_subscriber.name.or(subscriber.name);

                self.store
                    .update(subscriber.id, SubscriberChanges::reactivate(name.clone()))
                    .await
                    .map_err(SubscriptionError::Unexpected)?;

                self.send_welcome_email(&new_subscriber.email, name.as_ref())
                    .await;

                Ok(SubscriptionOutcome::Reactivated)
            }
            None => {
                self.store
                    .create(&new_subscriber)
                    .await
                    .map_err(SubscriptionError::Unexpected)?;

                if self
                    .send_welcome_email(&new_subscriber.email, new_subscriber.name.as_ref())
                    .await
                {
                    self.mark_welcome_email_sent(&new_subscriber.email).await;
                }

                Ok(SubscriptionOutcome::Subscribed)
            }
        }
    }

    async fn deactivate(
        &self,
        email: &SubscriberEmail,
    ) -> Result<SubscriptionOutcome, SubscriptionError> {
        let subscriber = self
            .store
            .find_by_email(email)
            .await
            .map_err(SubscriptionError::Unexpected)?
            .ok_or(SubscriptionError::NotFound)?;

        self.store
            .update(subscriber.id, SubscriberChanges::unsubscribe())
            .await
            .map_err(SubscriptionError::Unexpected)?;

        Ok(SubscriptionOutcome::Unsubscribed)
    }

    /// Returns whether the email was handed to the provider. Failures never reach the caller.
    async fn send_welcome_email(
        &self,
        email: &SubscriberEmail,
        name: Option<&SubscriberName>,
    ) -> bool {
        match self.notifier.send_welcome_email(email, name).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error.cause_chain = ?err, "Failed to send the welcome email");
                false
            }
        }
    }

    #[tracing::instrument(name = "Mark the welcome email as sent", skip(self, email))]
    async fn mark_welcome_email_sent(&self, email: &SubscriberEmail) {
        // The created record is looked up again: `create` does not hand back its id.
        let result = match self.store.find_by_email(email).await {
            Ok(Some(subscriber)) => {
                self.store
                    .update(subscriber.id, SubscriberChanges::welcome_email_sent())
                    .await
            }
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            tracing::warn!(error.cause_chain = ?err, "Failed to flag the welcome email as sent");
        }
    }
}

fn log_unexpected(err: SubscriptionError) -> SubscriptionError {
    if let SubscriptionError::Unexpected(_) = &err {
        tracing::error!(error.cause_chain = ?err, "Subscription operation failed");
    }
    err
}
