use std::sync::Arc;
use std::time::Duration;
use warden::application_impl::*;
use warden::application_port::*;
use warden::infra_memory::*;
use warden::logger::*;

// $ cargo run --bin lifecycle_demo
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "debug".to_string(),
    })?;

    let user_repo = Arc::new(MemoryUserRepo::new());
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
    let codec = JwtHs256Codec::new(JwtConfig {
        issuer: "warden.demo".to_string(),
        audience: "warden-demo".to_string(),
        access_ttl: Duration::from_secs(900),
        refresh_ttl: Duration::from_secs(3600),
        access_signing_key: b"demo-access".to_vec(),
        refresh_signing_key: b"demo-refresh".to_vec(),
    })?;
    let auth_service = RealAuthService::new(
        Arc::new(RealCredentialVerifier::new(user_repo.clone(), hasher.clone())),
        Arc::new(RealUserStore::new(user_repo, hasher)),
        Arc::new(codec),
        Arc::new(MemorySessionStore::new()),
    );

    let registered = auth_service
        .register(RegisterInput {
            email: "demo@example.com".to_string(),
            password: "correct horse".to_string(),
        })
        .await?;
    info!(user_id = %registered.identity.user_id, "registered");

    let r1 = registered.tokens.refresh_token;
    let r2 = auth_service.refresh(&r1.0).await?.tokens.refresh_token;
    info!("rotated once");

    // Replaying the first token must fail and leave r2 usable.
    let replay = auth_service.refresh(&r1.0).await;
    info!(rejected = replay.is_err(), "replayed first refresh token");

    auth_service.logout(&r2.0).await?;
    let after_logout = auth_service.refresh(&r2.0).await;
    info!(rejected = after_logout.is_err(), "refresh after logout");

    Ok(())
}
