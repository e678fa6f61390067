use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserCredentialsRecord {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserCredentialsRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            email: self.email.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a user. Fails with [`AuthError::Conflict`] if the email exists.
    async fn create(
        &self,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<UserCredentialsRecord, AuthError>;

    /// Fetch credentials by email (for login).
    async fn get_by_email(&self, email: &str) -> Result<Option<UserCredentialsRecord>, AuthError>;
}
