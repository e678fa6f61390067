use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Process-local session store.
///
/// `compare_and_rotate` runs while holding the shard write guard for the
/// subject, so the check and the swap cannot interleave with another caller.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<UserId, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(
        &self,
        user_id: UserId,
        session_id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.sessions.insert(
            user_id,
            SessionRecord {
                user_id,
                session_id: session_id.clone(),
                rotated_at: Utc::now(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get_current(&self, user_id: UserId) -> Result<Option<SessionRecord>, AuthError> {
        let now = Utc::now();
        Ok(self
            .sessions
            .get(&user_id)
            .filter(|rec| !rec.is_expired_at(now))
            .map(|rec| rec.value().clone()))
    }

    async fn compare_and_rotate(
        &self,
        user_id: UserId,
        expected: &SessionId,
        new: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let now = Utc::now();
        let Some(mut rec) = self.sessions.get_mut(&user_id) else {
            return Ok(false);
        };
        if rec.session_id != *expected || rec.is_expired_at(now) {
            return Ok(false);
        }
        rec.session_id = new.clone();
        rec.rotated_at = now;
        rec.expires_at = expires_at;
        Ok(true)
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.sessions.remove(&user_id).is_some())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut removed = 0u64;
        self.sessions.retain(|_, rec| {
            let keep = !rec.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
