use async_trait::async_trait;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::email_client::EmailClient;
use crate::error::error_chain_fmt;

const WELCOME_SUBJECT: &str = "Welcome to our newsletter";

#[derive(thiserror::Error)]
#[error("Failed to send the welcome email to {recipient}.")]
pub struct NotificationError {
    pub recipient: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl std::fmt::Debug for NotificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Sends the one-off welcome message to a (re)activated subscriber.
#[async_trait]
pub trait WelcomeNotifier: Send + Sync {
    async fn send_welcome_email(
        &self,
        email: &SubscriberEmail,
        name: Option<&SubscriberName>,
    ) -> Result<(), NotificationError>;
}

pub struct EmailWelcomeNotifier {
    email_client: EmailClient,
    site_url: String,
}

impl EmailWelcomeNotifier {
    pub fn new(email_client: EmailClient, site_url: String) -> Self {
        Self {
            email_client,
            site_url,
        }
    }

    fn welcome_html(&self, name: Option<&SubscriberName>) -> String {
        let greeting = name.map(|name| name.as_ref()).unwrap_or("there");

        format!(
            r#"
            <div>
                <h1>Welcome to our newsletter!</h1>
                <p>Hi {},</p>
                <p>Thank you for subscribing. You will hear from us about our programs, events and new resources.</p>
                <p>Visit us any time at <a href="{}">{}</a>.</p>
            </div>
        "#,
            greeting, self.site_url, self.site_url
        )
    }
}

#[async_trait]
impl WelcomeNotifier for EmailWelcomeNotifier {
    #[tracing::instrument(
        name = "Send a welcome email to a subscriber",
        skip(self, email, name),
        fields(subscriber_email = %email)
    )]
    async fn send_welcome_email(
        &self,
        email: &SubscriberEmail,
        name: Option<&SubscriberName>,
    ) -> Result<(), NotificationError> {
        let html_body = self.welcome_html(name);

        self.email_client
            .send_email(email, WELCOME_SUBJECT, &html_body)
            .await
            .map_err(|err| NotificationError {
                recipient: email.to_string(),
                source: Box::new(err),
            })
    }
}
