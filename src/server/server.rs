use crate::api::v1::RefreshCookie;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::server::SessionSweeper;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub refresh_cookie: RefreshCookie,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let needs_mysql = settings.user.backend == "mysql" || settings.session.backend == "mysql";
        let pool = if needs_mysql {
            let dsn = settings
                .mysql
                .as_ref()
                .map(|m| m.dsn.as_str())
                .filter(|dsn| !dsn.is_empty())
                .ok_or_else(|| anyhow!("mysql backend selected but mysql.dsn is not set"))?;
            Some(Pool::<MySql>::connect(dsn).await?)
        } else {
            None
        };
        let mysql_pool = || {
            pool.clone()
                .ok_or_else(|| anyhow!("mysql pool not initialized"))
        };

        let user_repo: Arc<dyn UserRepo> = match settings.user.backend.as_str() {
            "memory" => Arc::new(MemoryUserRepo::new()),
            "mysql" => Arc::new(MySqlUserRepo::new(mysql_pool()?)),
            other => return Err(anyhow!("Unknown user backend: {}", other)),
        };

        let session_store: Arc<dyn SessionStore> = match settings.session.backend.as_str() {
            "memory" => Arc::new(MemorySessionStore::new()),
            "redis" => {
                let url = settings.session.redis_url.as_deref().ok_or_else(|| {
                    anyhow!("redis backend selected but session.redis_url is not set")
                })?;
                let redis_client = redis::Client::open(url)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisSessionStore::new(
                    redis_manager,
                    settings.session.key_prefix.clone(),
                ))
            }
            "mysql" => Arc::new(MySqlSessionStore::new(mysql_pool()?)),
            other => return Err(anyhow!("Unknown session backend: {}", other)),
        };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let credential_verifier: Arc<dyn CredentialVerifier> = Arc::new(
            RealCredentialVerifier::new(user_repo.clone(), credential_hasher.clone()),
        );
        let user_store: Arc<dyn UserStore> =
            Arc::new(RealUserStore::new(user_repo, credential_hasher));

        let jwt = &settings.jwt;
        let token_codec: Arc<dyn TokenCodec> = Arc::new(
            JwtHs256Codec::new(JwtConfig {
                issuer: jwt.issuer.clone(),
                audience: jwt.audience.clone(),
                access_ttl: Duration::from_secs(jwt.access_ttl_secs),
                refresh_ttl: Duration::from_secs(jwt.refresh_ttl_secs),
                access_signing_key: jwt.access_secret.clone().into_bytes(),
                refresh_signing_key: jwt.refresh_secret.clone().into_bytes(),
            })
            .map_err(|e| anyhow!(e))?,
        );

        let auth_service: Arc<dyn AuthService> = Arc::new(
            RealAuthService::new(
                credential_verifier,
                user_store,
                token_codec,
                session_store.clone(),
            )
            .with_revoke_on_reuse(settings.session.revoke_on_reuse),
        );

        let refresh_cookie = RefreshCookie {
            name: settings.cookie.name.clone(),
            path: settings.cookie.path.clone(),
            secure: settings.cookie.secure,
            max_age_secs: jwt.refresh_ttl_secs,
        };

        let mut server = Self::from_parts(
            auth_service,
            session_store,
            refresh_cookie,
            Duration::from_secs(settings.session.sweep_interval_secs.max(1)),
        );
        server.pool = pool;

        info!(
            user_backend = %settings.user.backend,
            session_backend = %settings.session.backend,
            "server started"
        );
        Ok(server)
    }

    /// Assemble a server around an existing auth service and start sweeping
    /// `session_store`.
    pub fn from_parts(
        auth_service: Arc<dyn AuthService>,
        session_store: Arc<dyn SessionStore>,
        refresh_cookie: RefreshCookie,
        sweep_interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let sweeper = SessionSweeper::new(session_store, sweep_interval, cancel.clone());
        let sweeper_handle = tokio::spawn(async move {
            sweeper.run().await;
        });

        Self {
            auth_service,
            refresh_cookie,
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
            cancel,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self
            .sweeper_handle
            .lock()
            .ok()
            .and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
