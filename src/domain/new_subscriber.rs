use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;

pub const WEBSITE_SOURCE: &str = "website";

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: Option<SubscriberName>,
    pub source: String,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct NewSubscriberBody {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct UnsubscribeBody {
    pub email: String,
}

impl NewSubscriber {
    pub fn parse(email: &str, name: Option<&str>) -> Result<Self, String> {
        let email = SubscriberEmail::parse(email)?;
        let name = SubscriberName::parse(name);

        Ok(NewSubscriber {
            email,
            name,
            source: String::from(WEBSITE_SOURCE),
            subscribed_at: Utc::now(),
        })
    }
}
