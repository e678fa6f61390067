#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use warden::application_impl::*;
use warden::application_port::*;
use warden::domain_model::UserId;
use warden::domain_port::UserRepo;
use warden::infra_memory::*;

pub const ISSUER: &str = "warden.test";
pub const AUDIENCE: &str = "warden-client";
pub const ACCESS_SECRET: &[u8] = b"integration-access-secret";
pub const REFRESH_SECRET: &[u8] = b"integration-refresh-secret";

pub struct Harness {
    pub auth_service: Arc<RealAuthService>,
    pub session_store: Arc<MemorySessionStore>,
    pub user_repo: Arc<MemoryUserRepo>,
    pub token_codec: Arc<JwtHs256Codec>,
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        issuer: ISSUER.to_string(),
        audience: AUDIENCE.to_string(),
        access_ttl: Duration::from_secs(900),
        refresh_ttl: Duration::from_secs(30 * 24 * 3600),
        access_signing_key: ACCESS_SECRET.to_vec(),
        refresh_signing_key: REFRESH_SECRET.to_vec(),
    }
}

pub fn harness() -> Harness {
    harness_with(false)
}

pub fn harness_with(revoke_on_reuse: bool) -> Harness {
    let user_repo = Arc::new(MemoryUserRepo::new());
    let session_store = Arc::new(MemorySessionStore::new());
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
    let token_codec = Arc::new(JwtHs256Codec::new(jwt_config()).unwrap());

    let auth_service = RealAuthService::new(
        Arc::new(RealCredentialVerifier::new(user_repo.clone(), hasher.clone())),
        Arc::new(RealUserStore::new(user_repo.clone(), hasher)),
        token_codec.clone(),
        session_store.clone(),
    )
    .with_revoke_on_reuse(revoke_on_reuse);

    Harness {
        auth_service: Arc::new(auth_service),
        session_store,
        user_repo,
        token_codec,
    }
}

impl Harness {
    /// Seed a user directly, bypassing the password length rules of sign-up.
    pub async fn seed_user(&self, email: &str, password: &str) -> UserId {
        let hash = Argon2PasswordHasher.hash_password(password).await.unwrap();
        let user_id = UserId::new_random();
        self.user_repo.create(user_id, email, &hash).await.unwrap();
        user_id
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult {
        self.auth_service
            .login(LoginInput {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .unwrap()
    }
}
