use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use otpgate_core::{
    Email, OtpSession, SESSION_LIFETIME_MINUTES, SessionStore, SessionStoreError,
};
use redis::{Commands, Connection};
use secrecy::ExposeSecret;
use tokio::sync::RwLock;

use super::record::SessionRecord;

/// Redis-backed session store.
///
/// Each session is a Redis hash so the attempts field can be bumped with
/// HINCRBY, which is atomic server-side. The key carries a TTL matching the
/// session lifetime, so expired sessions are reclaimed by Redis itself.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: Arc<RwLock<Connection>>,
}

impl RedisSessionStore {
    pub fn new(conn: Arc<RwLock<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn save(&self, session: &OtpSession) -> Result<(), SessionStoreError> {
        let key = get_key(session.email());
        let record = SessionRecord::from(session);

        let fields = [
            ("email", record.email),
            ("code", record.code),
            ("attempts", record.attempts.to_string()),
            ("created_at", record.created_at.to_rfc3339()),
            ("expires_at", record.expires_at.to_rfc3339()),
            ("address_hash", record.address_hash),
            ("user_agent", record.user_agent),
        ];

        let mut conn = self.conn.write().await;
        let _: () = conn
            .hset_multiple(&key, &fields)
            .map_err(|e| SessionStoreError::UnexpectedError(e.to_string()))?;
        let _: () = conn
            .expire(&key, SESSION_LIFETIME_MINUTES * 60)
            .map_err(|e| SessionStoreError::UnexpectedError(e.to_string()))?;
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> Result<OtpSession, SessionStoreError> {
        let key = get_key(email);

        let mut conn = self.conn.write().await;
        let fields: HashMap<String, String> = conn
            .hgetall(&key)
            .map_err(|e| SessionStoreError::UnexpectedError(e.to_string()))?;
        drop(conn);

        if fields.is_empty() {
            return Err(SessionStoreError::SessionNotFound);
        }

        record_from_fields(fields)?.into_session()
    }

    async fn record_failed_attempt(&self, email: &Email) -> Result<(), SessionStoreError> {
        let key = get_key(email);

        let mut conn = self.conn.write().await;
        let exists: bool = conn
            .exists(&key)
            .map_err(|e| SessionStoreError::UnexpectedError(e.to_string()))?;
        if !exists {
            return Err(SessionStoreError::SessionNotFound);
        }

        let _: i64 = conn
            .hincr(&key, "attempts", 1)
            .map_err(|e| SessionStoreError::UnexpectedError(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, email: &Email) -> Result<(), SessionStoreError> {
        let key = get_key(email);

        let mut conn = self.conn.write().await;
        let removed: i64 = conn
            .del(&key)
            .map_err(|e| SessionStoreError::UnexpectedError(e.to_string()))?;
        if removed == 0 {
            return Err(SessionStoreError::SessionNotFound);
        }
        Ok(())
    }
}

// Key prefix to prevent collisions and organize data.
const SESSION_KEY_PREFIX: &str = "otp_session:";

fn get_key(email: &Email) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, email.as_ref().expose_secret())
}

fn record_from_fields(
    mut fields: HashMap<String, String>,
) -> Result<SessionRecord, SessionStoreError> {
    let mut take = |name: &str| {
        fields
            .remove(name)
            .ok_or_else(|| SessionStoreError::CorruptRecord(format!("missing field {name}")))
    };

    let email = take("email")?;
    let code = take("code")?;
    let attempts = take("attempts")?
        .parse::<u32>()
        .map_err(|e| SessionStoreError::CorruptRecord(e.to_string()))?;
    let created_at = parse_timestamp(&take("created_at")?)?;
    let expires_at = parse_timestamp(&take("expires_at")?)?;
    let address_hash = take("address_hash")?;
    let user_agent = take("user_agent")?;

    Ok(SessionRecord {
        email,
        code,
        attempts,
        created_at,
        expires_at,
        address_hash,
        user_agent,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SessionStoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| SessionStoreError::CorruptRecord(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_reported_as_corrupt() {
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), "user@example.com".to_string());

        assert_eq!(
            record_from_fields(fields).unwrap_err(),
            SessionStoreError::CorruptRecord(String::new())
        );
    }

    #[test]
    fn complete_fields_rebuild_a_record() {
        let now = Utc::now();
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), "user@example.com".to_string());
        fields.insert("code".to_string(), "123456".to_string());
        fields.insert("attempts".to_string(), "2".to_string());
        fields.insert("created_at".to_string(), now.to_rfc3339());
        fields.insert(
            "expires_at".to_string(),
            (now + chrono::Duration::minutes(5)).to_rfc3339(),
        );
        fields.insert("address_hash".to_string(), String::new());
        fields.insert("user_agent".to_string(), "cli/2.1".to_string());

        let record = record_from_fields(fields).unwrap();
        assert_eq!(record.attempts, 2);

        let session = record.into_session().unwrap();
        assert_eq!(session.attempts(), 2);
        assert_eq!(session.user_agent(), "cli/2.1");
    }
}
