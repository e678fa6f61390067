use crate::application_port::AuthError;
use crate::domain_model::UserId;
use sqlx::mysql::MySqlDatabaseError;
use uuid::Uuid;

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

pub fn store_err(e: sqlx::Error) -> AuthError {
    AuthError::Store(e.to_string())
}

#[inline]
pub fn uid_as_bytes(id: &UserId) -> &[u8] {
    id.0.as_bytes()
}

#[inline]
pub fn uid_from_bytes(id: &[u8]) -> Result<UserId, AuthError> {
    Ok(UserId(
        Uuid::from_slice(id).map_err(|e| AuthError::Store(e.to_string()))?,
    ))
}
