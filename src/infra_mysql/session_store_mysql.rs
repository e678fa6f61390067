use super::util::{store_err, uid_as_bytes};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Row-per-subject session table. Rotation is a single conditional `UPDATE`,
/// so InnoDB's row lock makes it atomic.
pub struct MySqlSessionStore {
    pool: MySqlPool,
}

impl MySqlSessionStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlSessionStore { pool }
    }

    fn row_to_record(user_id: UserId, row: MySqlRow) -> Result<SessionRecord, AuthError> {
        let session_id: String = row.try_get("session_id").map_err(store_err)?;
        let rotated_at: DateTime<Utc> = row.try_get("rotated_at").map_err(store_err)?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at").map_err(store_err)?;
        Ok(SessionRecord {
            user_id,
            session_id: SessionId(session_id),
            rotated_at,
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl SessionStore for MySqlSessionStore {
    async fn put(
        &self,
        user_id: UserId,
        session_id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO auth_session (user_id, session_id, rotated_at, expires_at)
VALUES (?, ?, ?, ?)
ON DUPLICATE KEY UPDATE
    session_id = VALUES(session_id),
    rotated_at = VALUES(rotated_at),
    expires_at = VALUES(expires_at)
"#,
        )
        .bind(uid_as_bytes(&user_id))
        .bind(session_id.as_str())
        .bind(Utc::now())
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get_current(&self, user_id: UserId) -> Result<Option<SessionRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT session_id, rotated_at, expires_at
FROM auth_session
WHERE user_id = ? AND expires_at > ?
"#,
        )
        .bind(uid_as_bytes(&user_id))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt
            .map(|row| Self::row_to_record(user_id, row))
            .transpose()
    }

    async fn compare_and_rotate(
        &self,
        user_id: UserId,
        expected: &SessionId,
        new: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
UPDATE auth_session
SET session_id = ?, rotated_at = ?, expires_at = ?
WHERE user_id = ? AND session_id = ? AND expires_at > ?
"#,
        )
        .bind(new.as_str())
        .bind(now)
        .bind(expires_at)
        .bind(uid_as_bytes(&user_id))
        .bind(expected.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM auth_session WHERE user_id = ?")
            .bind(uid_as_bytes(&user_id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM auth_session WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected())
    }
}
