use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

const SESSION_ROTATE: &str = include_str!("session_rotate.lua");

/// One hash per subject: `{sid, rotated_at, expires_at}`, with the key set to
/// expire together with the refresh token, so no sweeping is needed.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
    rotate: Script,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionStore {
            conn,
            prefix: prefix.into(),
            rotate: Script::new(SESSION_ROTATE),
        }
    }

    fn key(&self, user_id: UserId) -> String {
        format!("{}:{}", self.prefix, user_id)
    }
}

fn store_err(e: redis::RedisError) -> AuthError {
    AuthError::Store(e.to_string())
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(
        &self,
        user_id: UserId,
        session_id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let fields = [
            ("sid", session_id.to_string()),
            ("rotated_at", Utc::now().timestamp().to_string()),
            ("expires_at", expires_at.timestamp().to_string()),
        ];
        let _: () = redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(&key, &fields)
            .ignore()
            .expire_at(&key, expires_at.timestamp())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn get_current(&self, user_id: UserId) -> Result<Option<SessionRecord>, AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let (sid, rotated_at, expires_at): (Option<String>, Option<i64>, Option<i64>) = conn
            .hget(&key, &["sid", "rotated_at", "expires_at"])
            .await
            .map_err(store_err)?;

        let (Some(sid), Some(rotated_at), Some(expires_at)) = (sid, rotated_at, expires_at) else {
            return Ok(None);
        };
        let (Some(rotated_at), Some(expires_at)) = (
            DateTime::<Utc>::from_timestamp(rotated_at, 0),
            DateTime::<Utc>::from_timestamp(expires_at, 0),
        ) else {
            return Err(AuthError::Store(format!("corrupt session record at {key}")));
        };

        let rec = SessionRecord {
            user_id,
            session_id: SessionId(sid),
            rotated_at,
            expires_at,
        };
        Ok((!rec.is_expired_at(Utc::now())).then_some(rec))
    }

    async fn compare_and_rotate(
        &self,
        user_id: UserId,
        expected: &SessionId,
        new: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let swapped: i64 = self
            .rotate
            .key(&key)
            .arg(expected.as_str())
            .arg(new.as_str())
            .arg(Utc::now().timestamp())
            .arg(expires_at.timestamp())
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(swapped == 1)
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(&key).await.map_err(store_err)?;
        Ok(removed > 0)
    }

    async fn sweep_expired(&self, _now: DateTime<Utc>) -> Result<u64, AuthError> {
        // Keys carry their own TTL.
        Ok(0)
    }
}
