use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub jwt: Jwt,
    pub session: Session,
    pub user: User,
    #[serde(default)]
    pub mysql: Option<MySql>,
    #[serde(default)]
    pub cookie: Cookie,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    /// TLS is enabled when both paths are set.
    #[serde(default)]
    pub cert_path: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Deserialize)]
pub struct Jwt {
    pub issuer: String,
    pub audience: String,
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
}

impl fmt::Debug for Jwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwt")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

#[derive(Deserialize)]
pub struct Session {
    pub backend: String, // "memory", "redis" or "mysql"
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default)]
    pub revoke_on_reuse: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The URL may carry a password.
        let redis_url = self.redis_url.as_ref().map(|_| "<redacted>");
        f.debug_struct("Session")
            .field("backend", &self.backend)
            .field("redis_url", &redis_url)
            .field("key_prefix", &self.key_prefix)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .field("revoke_on_reuse", &self.revoke_on_reuse)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub backend: String, // "memory" or "mysql"
}

#[derive(Deserialize)]
pub struct MySql {
    pub dsn: String,
}

impl fmt::Debug for MySql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySql").field("dsn", &"<redacted>").finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
}

impl Default for Cookie {
    fn default() -> Self {
        Cookie {
            name: default_cookie_name(),
            path: default_cookie_path(),
            secure: false,
        }
    }
}

fn default_access_ttl_secs() -> u64 {
    15 * 60 // 15 minutes
}

fn default_refresh_ttl_secs() -> u64 {
    30 * 24 * 60 * 60 // 30 days
}

fn default_key_prefix() -> String {
    "warden:session".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    5 * 60
}

fn default_cookie_name() -> String {
    "refreshToken".to_string()
}

fn default_cookie_path() -> String {
    "/api/v1/auth".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Load settings from a TOML file, then let `WARDEN__SECTION__KEY`
/// environment variables override individual values.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix("WARDEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
