use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use otpgate_core::{Email, OtpSession, SessionStore, SessionStoreError};

use super::record::SessionRecord;

/// In-memory session store for tests and single-process deployments.
///
/// The failed-attempt increment happens under the write lock, in place, so
/// concurrent wrong guesses cannot lose updates.
#[derive(Default, Clone)]
pub struct HashMapSessionStore {
    sessions: Arc<RwLock<HashMap<Email, SessionRecord>>>,
}

impl HashMapSessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for HashMapSessionStore {
    async fn save(&self, session: &OtpSession) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.email().clone(), SessionRecord::from(session));
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> Result<OtpSession, SessionStoreError> {
        let sessions = self.sessions.read().await;
        let Some(record) = sessions.get(email) else {
            return Err(SessionStoreError::SessionNotFound);
        };
        record.clone().into_session()
    }

    async fn record_failed_attempt(&self, email: &Email) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(email)
            .ok_or(SessionStoreError::SessionNotFound)?;
        record.attempts += 1;
        Ok(())
    }

    async fn delete(&self, email: &Email) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(email)
            .ok_or(SessionStoreError::SessionNotFound)?;
        Ok(())
    }
}
