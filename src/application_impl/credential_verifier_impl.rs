use crate::application_port::*;
use crate::domain_model::Identity;
use crate::domain_port::UserRepo;
use std::sync::Arc;

pub struct RealCredentialVerifier {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
}

impl RealCredentialVerifier {
    pub fn new(user_repo: Arc<dyn UserRepo>, credential_hasher: Arc<dyn CredentialHasher>) -> Self {
        RealCredentialVerifier {
            user_repo,
            credential_hasher,
        }
    }
}

#[async_trait::async_trait]
impl CredentialVerifier for RealCredentialVerifier {
    async fn verify(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let Some(rec) = self.user_repo.get_by_email(email).await? else {
            // Burn a hash so an unknown email costs about as much as a wrong password.
            let _ = self.credential_hasher.hash_password(password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !rec.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(rec.identity())
    }
}
