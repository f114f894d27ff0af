use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, Secret};
use thiserror::Error;

// Local part, domain, 2-4 letter TLD.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,4}$")
        .expect("email pattern must compile")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("invalid email format")]
    InvalidFormat,
}

/// A validated email address.
///
/// The raw address is kept behind [`Secret`] so it never shows up in debug
/// output or logs. Equality and hashing go through the underlying value,
/// which lets `Email` key session maps.
#[derive(Debug, Clone)]
pub struct Email(Secret<String>);

impl TryFrom<Secret<String>> for Email {
    type Error = EmailError;

    fn try_from(raw: Secret<String>) -> Result<Self, Self::Error> {
        if EMAIL_PATTERN.is_match(raw.expose_secret()) {
            Ok(Self(raw))
        } else {
            Err(EmailError::InvalidFormat)
        }
    }
}

impl AsRef<Secret<String>> for Email {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

impl PartialEq for Email {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Eq for Email {}

impl Hash for Email {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.expose_secret().hash(state);
    }
}
