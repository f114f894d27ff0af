use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{email::Email, session::OtpSession};

// SessionStore port trait and errors
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Session not found")]
    SessionNotFound,
    #[error("Corrupt session record: {0}")]
    CorruptRecord(String),
    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl PartialEq for SessionStoreError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::SessionNotFound, Self::SessionNotFound) => true,
            (Self::CorruptRecord(_), Self::CorruptRecord(_)) => true,
            (Self::UnexpectedError(_), Self::UnexpectedError(_)) => true,
            _ => false,
        }
    }
}

/// Durable keyed storage for OTP sessions, keyed by email.
///
/// Last-write-wins on `save`; `record_failed_attempt` is the one operation
/// required to be atomic in-place, so concurrent failed guesses all land in
/// the persisted counter.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: &OtpSession) -> Result<(), SessionStoreError>;
    async fn find_by_email(&self, email: &Email) -> Result<OtpSession, SessionStoreError>;
    async fn record_failed_attempt(&self, email: &Email) -> Result<(), SessionStoreError>;
    async fn delete(&self, email: &Email) -> Result<(), SessionStoreError>;
}
