use super::util::{is_dup_key, store_err, uid_as_bytes, uid_from_bytes};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<UserCredentialsRecord, AuthError> {
        let user_id_bytes: Vec<u8> = row.try_get("user_id").map_err(store_err)?;
        let user_id = uid_from_bytes(&user_id_bytes)?;

        let email: String = row.try_get("email").map_err(store_err)?;
        let password_hash: String = row.try_get("password_hash").map_err(store_err)?;
        let is_active: bool = row.try_get("is_active").map_err(store_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_err)?;

        Ok(UserCredentialsRecord {
            user_id,
            email,
            password_hash,
            is_active,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create(
        &self,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<UserCredentialsRecord, AuthError> {
        let created_at = Utc::now();
        sqlx::query(
            r#"
INSERT INTO app_user (user_id, email, password_hash, is_active, created_at)
VALUES (?, ?, ?, TRUE, ?)
"#,
        )
        .bind(uid_as_bytes(&user_id))
        .bind(email)
        .bind(password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::Conflict
            } else {
                store_err(e)
            }
        })?;

        Ok(UserCredentialsRecord {
            user_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            created_at,
        })
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserCredentialsRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email, password_hash, is_active, created_at
FROM app_user
WHERE email = ?
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_record).transpose()
    }
}
