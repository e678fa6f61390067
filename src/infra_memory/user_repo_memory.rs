use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Process-local user table keyed by (normalized) email.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<String, UserCredentialsRecord>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(
        &self,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<UserCredentialsRecord, AuthError> {
        match self.users.entry(email.to_string()) {
            Entry::Occupied(_) => Err(AuthError::Conflict),
            Entry::Vacant(slot) => {
                let rec = UserCredentialsRecord {
                    user_id,
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    is_active: true,
                    created_at: Utc::now(),
                };
                slot.insert(rec.clone());
                Ok(rec)
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserCredentialsRecord>, AuthError> {
        Ok(self.users.get(email).map(|rec| rec.value().clone()))
    }
}
