use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Upsert the subject's session, replacing any previous one.
    async fn put(
        &self,
        user_id: UserId,
        session_id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// The subject's live session. Expired records read as `None`.
    async fn get_current(&self, user_id: UserId) -> Result<Option<SessionRecord>, AuthError>;

    /// Atomically swap `expected` for `new`. Returns `false` without touching
    /// the record if the stored id differs, the record expired, or none exists.
    /// Two callers presenting the same `expected` never both see `true`.
    async fn compare_and_rotate(
        &self,
        user_id: UserId,
        expected: &SessionId,
        new: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError>;

    /// Returns whether a record was removed.
    async fn delete(&self, user_id: UserId) -> Result<bool, AuthError>;

    /// Remove every record expired at `now`, returning how many went.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}
