use crate::application_port::*;
use crate::domain_model::{Identity, UserId};
use crate::domain_port::UserRepo;
use std::sync::Arc;

pub struct RealUserStore {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
}

impl RealUserStore {
    pub fn new(user_repo: Arc<dyn UserRepo>, credential_hasher: Arc<dyn CredentialHasher>) -> Self {
        RealUserStore {
            user_repo,
            credential_hasher,
        }
    }
}

#[async_trait::async_trait]
impl UserStore for RealUserStore {
    async fn create(&self, input: RegisterInput) -> Result<Identity, AuthError> {
        let RegisterInput { email, password } = input;

        if self.user_repo.get_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        // The repo enforces uniqueness again; a concurrent signup loses there.
        let rec = self
            .user_repo
            .create(UserId::new_random(), &email, &password_hash)
            .await?;

        Ok(rec.identity())
    }
}
