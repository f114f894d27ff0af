use otpgate_core::{Email, EmailError, SessionError, SessionStore, SessionStoreError};
use secrecy::Secret;

use crate::outcome::Outcome;

/// Error types for the verify-OTP use case
#[derive(Debug, thiserror::Error)]
pub enum VerifyOtpError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("no active otp session")]
    SessionNotFound,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("session store error: {0}")]
    SessionStore(SessionStoreError),
}

impl VerifyOtpError {
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::InvalidEmail(_) => Outcome::InvalidEmail,
            // No-session and every state-machine rejection collapse to the
            // same outcome: an attacker probing emails learns nothing.
            Self::SessionNotFound | Self::Session(_) => Outcome::CodeRejected,
            Self::SessionStore(_) => Outcome::Infrastructure,
        }
    }
}

/// Verify OTP use case - drives the session state machine against a guess
pub struct VerifyOtpUseCase<S>
where
    S: SessionStore,
{
    sessions: S,
}

impl<S> VerifyOtpUseCase<S>
where
    S: SessionStore,
{
    pub fn new(sessions: S) -> Self {
        Self { sessions }
    }

    /// Execute the verify-OTP use case
    ///
    /// Loads the session for the email and lets the entity decide. A wrong
    /// guess is persisted through the store's atomic increment before the
    /// rejection is returned; a bookkeeping failure never overturns the
    /// security decision. A verified session is deleted (one-time use), and a
    /// failed delete is non-fatal since the session expires on its own.
    #[tracing::instrument(name = "VerifyOtpUseCase::execute", skip_all)]
    pub async fn execute(&self, raw_email: &str, raw_code: &str) -> Result<(), VerifyOtpError> {
        let email = Email::try_from(Secret::from(raw_email.to_string()))?;

        let mut session = self
            .sessions
            .find_by_email(&email)
            .await
            .map_err(|e| match e {
                SessionStoreError::SessionNotFound => VerifyOtpError::SessionNotFound,
                other => VerifyOtpError::SessionStore(other),
            })?;

        match session.verify(raw_code) {
            Ok(()) => {
                if let Err(e) = self.sessions.delete(&email).await {
                    tracing::warn!(error = %e, "failed to delete verified otp session");
                }
                Ok(())
            }
            Err(SessionError::InvalidCode) => {
                if let Err(e) = self.sessions.record_failed_attempt(&email).await {
                    // A lost increment weakens the attempt cap.
                    tracing::error!(error = %e, "failed to persist otp attempt increment");
                }
                Err(SessionError::InvalidCode.into())
            }
            // Expired or locked: the gate rejected before any comparison and
            // the session is not further penalized.
            Err(gate) => Err(gate.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use chrono::{Duration, Utc};
    use otpgate_core::{AddressHash, OtpCode, OtpSession, SessionSnapshot};
    use tokio::sync::RwLock;

    use super::*;

    #[derive(Clone, Default)]
    struct TestSessionStore {
        sessions: Arc<RwLock<HashMap<Email, OtpSession>>>,
        increments: Arc<AtomicU32>,
        deletes: Arc<AtomicU32>,
        fail_increment: bool,
        fail_delete: bool,
    }

    impl TestSessionStore {
        async fn insert(&self, session: OtpSession) {
            self.sessions
                .write()
                .await
                .insert(session.email().clone(), session);
        }
    }

    #[async_trait::async_trait]
    impl SessionStore for TestSessionStore {
        async fn save(&self, session: &OtpSession) -> Result<(), SessionStoreError> {
            self.insert(session.clone()).await;
            Ok(())
        }

        async fn find_by_email(&self, email: &Email) -> Result<OtpSession, SessionStoreError> {
            self.sessions
                .read()
                .await
                .get(email)
                .cloned()
                .ok_or(SessionStoreError::SessionNotFound)
        }

        async fn record_failed_attempt(&self, email: &Email) -> Result<(), SessionStoreError> {
            if self.fail_increment {
                return Err(SessionStoreError::UnexpectedError("write timeout".into()));
            }
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(email)
                .ok_or(SessionStoreError::SessionNotFound)?;
            session.record_failed_attempt();
            self.increments.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, email: &Email) -> Result<(), SessionStoreError> {
            if self.fail_delete {
                return Err(SessionStoreError::UnexpectedError("write timeout".into()));
            }
            self.sessions
                .write()
                .await
                .remove(email)
                .ok_or(SessionStoreError::SessionNotFound)?;
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn email(raw: &str) -> Email {
        Email::try_from(Secret::from(raw.to_string())).unwrap()
    }

    fn active_session(raw_email: &str, code: &str) -> OtpSession {
        OtpSession::new(email(raw_email), OtpCode::parse(code).unwrap())
    }

    fn expired_session(raw_email: &str, code: &str) -> OtpSession {
        let created = Utc::now() - Duration::minutes(10);
        OtpSession::restore(SessionSnapshot {
            email: email(raw_email),
            code: OtpCode::parse(code).unwrap(),
            attempts: 0,
            created_at: created,
            expires_at: created + Duration::minutes(5),
            address_hash: AddressHash::empty(),
            user_agent: String::new(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn correct_code_verifies_once_and_deletes_the_session() {
        let store = TestSessionStore::default();
        store.insert(active_session("user@example.com", "123456")).await;
        let use_case = VerifyOtpUseCase::new(store.clone());

        assert!(use_case.execute("user@example.com", "123456").await.is_ok());
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);

        // One-time use: the second attempt finds nothing.
        let second = use_case.execute("user@example.com", "123456").await;
        assert!(matches!(second, Err(VerifyOtpError::SessionNotFound)));
    }

    #[tokio::test]
    async fn wrong_code_is_rejected_and_the_attempt_is_persisted() {
        let store = TestSessionStore::default();
        store.insert(active_session("user@example.com", "123456")).await;
        let use_case = VerifyOtpUseCase::new(store.clone());

        let result = use_case.execute("user@example.com", "000000").await;
        assert!(matches!(
            result,
            Err(VerifyOtpError::Session(SessionError::InvalidCode))
        ));
        assert_eq!(store.increments.load(Ordering::SeqCst), 1);

        let session = store.find_by_email(&email("user@example.com")).await.unwrap();
        assert_eq!(session.attempts(), 1);
    }

    #[tokio::test]
    async fn three_wrong_guesses_lock_the_session_for_good() {
        let store = TestSessionStore::default();
        store.insert(active_session("user@example.com", "123456")).await;
        let use_case = VerifyOtpUseCase::new(store.clone());

        for _ in 0..3 {
            let result = use_case.execute("user@example.com", "000000").await;
            assert!(matches!(
                result,
                Err(VerifyOtpError::Session(SessionError::InvalidCode))
            ));
        }

        // Fourth call with the correct code: the cap rejects, no increment.
        let result = use_case.execute("user@example.com", "123456").await;
        assert!(matches!(
            result,
            Err(VerifyOtpError::Session(SessionError::TooManyAttempts))
        ));
        assert_eq!(store.increments.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn expired_session_is_rejected_without_bookkeeping() {
        let store = TestSessionStore::default();
        store.insert(expired_session("user@example.com", "123456")).await;
        let use_case = VerifyOtpUseCase::new(store.clone());

        let result = use_case.execute("user@example.com", "123456").await;
        assert!(matches!(
            result,
            Err(VerifyOtpError::Session(SessionError::Expired))
        ));
        assert_eq!(store.increments.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_session_reports_not_found() {
        let store = TestSessionStore::default();
        let use_case = VerifyOtpUseCase::new(store);

        let result = use_case.execute("user@example.com", "123456").await;
        assert!(matches!(result, Err(VerifyOtpError::SessionNotFound)));
    }

    #[tokio::test]
    async fn bookkeeping_failure_keeps_the_rejection() {
        let store = TestSessionStore {
            fail_increment: true,
            ..Default::default()
        };
        store.insert(active_session("user@example.com", "123456")).await;
        let use_case = VerifyOtpUseCase::new(store);

        let result = use_case.execute("user@example.com", "000000").await;
        assert!(matches!(
            result,
            Err(VerifyOtpError::Session(SessionError::InvalidCode))
        ));
    }

    #[tokio::test]
    async fn delete_failure_does_not_overturn_success() {
        let store = TestSessionStore {
            fail_delete: true,
            ..Default::default()
        };
        store.insert(active_session("user@example.com", "123456")).await;
        let use_case = VerifyOtpUseCase::new(store);

        assert!(use_case.execute("user@example.com", "123456").await.is_ok());
    }

    #[tokio::test]
    async fn rejection_outcomes_are_indistinguishable() {
        let not_found = VerifyOtpError::SessionNotFound.outcome();
        let expired = VerifyOtpError::Session(SessionError::Expired).outcome();
        let locked = VerifyOtpError::Session(SessionError::TooManyAttempts).outcome();
        let wrong = VerifyOtpError::Session(SessionError::InvalidCode).outcome();

        assert_eq!(not_found, Outcome::CodeRejected);
        assert_eq!(expired, Outcome::CodeRejected);
        assert_eq!(locked, Outcome::CodeRejected);
        assert_eq!(wrong, Outcome::CodeRejected);
    }
}
