use chrono::{DateTime, Utc};
use otpgate_core::{
    AddressHash, Email, OtpCode, OtpSession, SessionSnapshot, SessionStoreError,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Storage form of an OTP session.
///
/// Raw strings only. Rehydration runs every field back through its value
/// object constructor and then the entity restore path, so nothing reaches
/// the state machine without validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub email: String,
    pub code: String,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub address_hash: String,
    pub user_agent: String,
}

impl From<&OtpSession> for SessionRecord {
    fn from(session: &OtpSession) -> Self {
        let snapshot = session.snapshot();
        Self {
            email: snapshot.email.as_ref().expose_secret().clone(),
            code: snapshot.code.as_str().to_string(),
            attempts: snapshot.attempts,
            created_at: snapshot.created_at,
            expires_at: snapshot.expires_at,
            address_hash: snapshot.address_hash.as_str().to_string(),
            user_agent: snapshot.user_agent,
        }
    }
}

impl SessionRecord {
    pub fn into_session(self) -> Result<OtpSession, SessionStoreError> {
        let email = Email::try_from(Secret::from(self.email))
            .map_err(|e| SessionStoreError::CorruptRecord(e.to_string()))?;
        let code = OtpCode::parse(&self.code)
            .map_err(|e| SessionStoreError::CorruptRecord(e.to_string()))?;

        OtpSession::restore(SessionSnapshot {
            email,
            code,
            attempts: self.attempts,
            created_at: self.created_at,
            expires_at: self.expires_at,
            address_hash: AddressHash::from_hex(self.address_hash),
            user_agent: self.user_agent,
        })
        .map_err(|e| SessionStoreError::CorruptRecord(e.to_string()))
    }
}
