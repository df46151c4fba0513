use validator::validate_email;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Parses a raw email and normalizes it (trimmed, lowercased) so it can be used as the
    /// subscriber identity key. The error is meant to be shown to the end user.
    pub fn parse(email: &str) -> Result<SubscriberEmail, String> {
        let email = email.trim().to_lowercase();

        if email.is_empty() {
            return Err(String::from("Email is required"));
        }

        if !validate_email(email.as_str()) || !has_dotted_domain(&email) {
            return Err(String::from("Please enter a valid email address"));
        }

        Ok(Self(email))
    }

    /// Wraps an email read back from the subscribers table without re-checking it.
    pub fn from_stored(email: String) -> SubscriberEmail {
        Self(email)
    }
}

fn has_dotted_domain(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((_, domain)) => domain
            .rsplit_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
            .unwrap_or(false),
        None => false,
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
