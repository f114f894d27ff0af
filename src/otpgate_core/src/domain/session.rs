use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::{address_hash::AddressHash, email::Email, otp_code::OtpCode};

/// How long an issued code stays valid.
pub const SESSION_LIFETIME_MINUTES: i64 = 5;

/// Failed guesses allowed before the session locks.
pub const MAX_VERIFICATION_ATTEMPTS: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("otp session has expired")]
    Expired,
    #[error("too many failed verification attempts")]
    TooManyAttempts,
    #[error("invalid otp code")]
    InvalidCode,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RestoreError {
    #[error("expiry must be after creation")]
    ExpiryBeforeCreation,
}

/// An OTP verification session for one user.
///
/// This is an entity, not a value object: it is identified by its email, it
/// carries mutable state (the attempts counter) and it has a lifecycle
/// (created, then verified and deleted, or locked/expired). Everything except
/// `attempts` is immutable after construction, and `attempts` only moves
/// through [`OtpSession::verify`] and [`OtpSession::record_failed_attempt`].
#[derive(Debug, Clone)]
pub struct OtpSession {
    email: Email,
    code: OtpCode,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    address_hash: AddressHash,
    user_agent: String,
    attempts: u32,
}

impl OtpSession {
    /// Creates a fresh session expiring [`SESSION_LIFETIME_MINUTES`] from now.
    pub fn new(email: Email, code: OtpCode) -> Self {
        let now = Utc::now();
        Self {
            email,
            code,
            created_at: now,
            expires_at: now + Duration::minutes(SESSION_LIFETIME_MINUTES),
            address_hash: AddressHash::empty(),
            user_agent: String::new(),
            attempts: 0,
        }
    }

    /// Creates a fresh session carrying audit metadata: the client address is
    /// stored hashed, never raw.
    pub fn with_audit(email: Email, code: OtpCode, raw_address: &str, user_agent: &str) -> Self {
        let mut session = Self::new(email, code);
        session.address_hash = AddressHash::from_address(raw_address);
        session.user_agent = user_agent.to_owned();
        session
    }

    /// Gate evaluated before any code comparison. Expiry wins over the
    /// attempt cap.
    pub fn can_verify(&self) -> Result<(), SessionError> {
        if self.is_expired() {
            return Err(SessionError::Expired);
        }
        if self.attempts >= MAX_VERIFICATION_ATTEMPTS {
            return Err(SessionError::TooManyAttempts);
        }
        Ok(())
    }

    /// Checks `input` against the stored code.
    ///
    /// An expired or locked session returns the gate error untouched, without
    /// an attempt increment. Otherwise the comparison is constant-time; any
    /// mismatch (including a length mismatch) costs an attempt. A match
    /// leaves the counter where it is.
    pub fn verify(&mut self, input: &str) -> Result<(), SessionError> {
        self.can_verify()?;

        // ct_eq treats a length mismatch as a non-match up front; content is
        // only ever compared in constant time.
        let matches = self.code.as_str().as_bytes().ct_eq(input.as_bytes());
        if !bool::from(matches) {
            self.attempts += 1;
            return Err(SessionError::InvalidCode);
        }

        Ok(())
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Direct counter increment. Restoration and administrative paths only;
    /// request handling goes through [`OtpSession::verify`].
    pub fn record_failed_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn code(&self) -> &OtpCode {
        &self.code
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn address_hash(&self) -> &AddressHash {
        &self.address_hash
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Captures every persisted field for storage.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            email: self.email.clone(),
            code: self.code.clone(),
            attempts: self.attempts,
            created_at: self.created_at,
            expires_at: self.expires_at,
            address_hash: self.address_hash.clone(),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Reconstructs a session from persisted fields.
    ///
    /// Storage-layer use only: this is the one sanctioned way to resurrect
    /// mutable state, and it validates the snapshot before bypassing the
    /// normal constructors. Application code creates sessions with
    /// [`OtpSession::new`] or [`OtpSession::with_audit`].
    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, RestoreError> {
        if snapshot.expires_at <= snapshot.created_at {
            return Err(RestoreError::ExpiryBeforeCreation);
        }

        Ok(Self {
            email: snapshot.email,
            code: snapshot.code,
            created_at: snapshot.created_at,
            expires_at: snapshot.expires_at,
            address_hash: snapshot.address_hash,
            user_agent: snapshot.user_agent,
            attempts: snapshot.attempts,
        })
    }
}

/// All fields needed to persist and restore an [`OtpSession`].
///
/// Field types are already-validated value objects, so a snapshot built from
/// raw storage data must run each raw field through its own constructor
/// first.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub email: Email,
    pub code: OtpCode,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub address_hash: AddressHash,
    pub user_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn email() -> Email {
        Email::try_from(Secret::from("user@example.com".to_string())).unwrap()
    }

    fn session_with_code(code: &str) -> OtpSession {
        OtpSession::new(email(), OtpCode::parse(code).unwrap())
    }

    fn expired_session(code: &str) -> OtpSession {
        let created = Utc::now() - Duration::minutes(10);
        OtpSession::restore(SessionSnapshot {
            email: email(),
            code: OtpCode::parse(code).unwrap(),
            attempts: 0,
            created_at: created,
            expires_at: created + Duration::minutes(5),
            address_hash: AddressHash::empty(),
            user_agent: String::new(),
        })
        .unwrap()
    }

    #[test]
    fn fresh_session_starts_active() {
        let session = session_with_code("123456");
        assert_eq!(session.attempts(), 0);
        assert!(!session.is_expired());
        assert_eq!(session.can_verify(), Ok(()));
        assert!(session.expires_at() > session.created_at());
    }

    #[test]
    fn correct_code_verifies_without_moving_the_counter() {
        // Scenario C.
        let mut session = session_with_code("123456");
        assert_eq!(session.verify("123456"), Ok(()));
        assert_eq!(session.attempts(), 0);
    }

    #[test]
    fn wrong_code_increments_until_locked() {
        // Scenario A.
        let mut session = session_with_code("123456");

        for expected_attempts in 1..=3 {
            assert_eq!(session.verify("000000"), Err(SessionError::InvalidCode));
            assert_eq!(session.attempts(), expected_attempts);
        }

        // The correct code no longer helps, and the gate rejects before any
        // comparison can happen.
        assert_eq!(session.verify("123456"), Err(SessionError::TooManyAttempts));
        assert_eq!(session.attempts(), 3);
    }

    #[test]
    fn expired_session_rejects_without_penalty() {
        // Scenario B.
        let mut session = expired_session("123456");
        assert_eq!(session.verify("123456"), Err(SessionError::Expired));
        assert_eq!(session.verify("anything"), Err(SessionError::Expired));
        assert_eq!(session.attempts(), 0);
    }

    #[test]
    fn expiry_is_checked_before_the_attempt_cap() {
        let created = Utc::now() - Duration::minutes(10);
        let session = OtpSession::restore(SessionSnapshot {
            email: email(),
            code: OtpCode::parse("123456").unwrap(),
            attempts: 3,
            created_at: created,
            expires_at: created + Duration::minutes(5),
            address_hash: AddressHash::empty(),
            user_agent: String::new(),
        })
        .unwrap();

        assert_eq!(session.can_verify(), Err(SessionError::Expired));
    }

    #[test]
    fn length_mismatch_is_a_failed_attempt() {
        let mut session = session_with_code("123456");
        assert_eq!(session.verify("123"), Err(SessionError::InvalidCode));
        assert_eq!(session.attempts(), 1);
    }

    #[test]
    fn locked_session_does_not_accumulate_further_attempts() {
        let mut session = session_with_code("123456");
        for _ in 0..3 {
            let _ = session.verify("000000");
        }
        assert_eq!(session.verify("000000"), Err(SessionError::TooManyAttempts));
        assert_eq!(session.attempts(), 3);
    }

    #[test]
    fn audit_metadata_is_hashed() {
        let session = OtpSession::with_audit(
            email(),
            OtpCode::parse("123456").unwrap(),
            "203.0.113.7",
            "integration-suite/1.0",
        );

        assert_eq!(
            session.address_hash(),
            &AddressHash::from_address("203.0.113.7")
        );
        assert_eq!(session.user_agent(), "integration-suite/1.0");
    }

    #[test]
    fn restored_session_behaves_like_the_original() {
        let mut original = session_with_code("123456");
        let _ = original.verify("000000");
        let _ = original.verify("111111");

        let mut restored = OtpSession::restore(original.snapshot()).unwrap();
        assert_eq!(restored.attempts(), 2);
        assert_eq!(restored.email(), original.email());
        assert_eq!(restored.expires_at(), original.expires_at());

        // One more failure locks it, exactly as it would the original.
        assert_eq!(restored.verify("222222"), Err(SessionError::InvalidCode));
        assert_eq!(restored.verify("123456"), Err(SessionError::TooManyAttempts));
    }

    #[test]
    fn restore_rejects_inverted_timestamps() {
        let now = Utc::now();
        let result = OtpSession::restore(SessionSnapshot {
            email: email(),
            code: OtpCode::parse("123456").unwrap(),
            attempts: 0,
            created_at: now,
            expires_at: now - Duration::minutes(5),
            address_hash: AddressHash::empty(),
            user_agent: String::new(),
        });

        assert_eq!(result.unwrap_err(), RestoreError::ExpiryBeforeCreation);
    }

    #[test]
    fn record_failed_attempt_moves_the_counter() {
        let mut session = session_with_code("123456");
        session.record_failed_attempt();
        session.record_failed_attempt();
        assert_eq!(session.attempts(), 2);
    }
}
