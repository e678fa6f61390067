use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already registered")]
    Conflict,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("session is no longer valid")]
    SessionInvalid,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<TokenError> for AuthError {
    fn from(_: TokenError) -> Self {
        AuthError::Unauthorized
    }
}

/// Precise verification failures. Callers of the auth service only ever see
/// [`AuthError::Unauthorized`] for these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("wrong token type")]
    WrongType,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AuthResult {
    pub identity: Identity,
    pub tokens: AuthTokens,
}

pub trait TokenCodec: Send + Sync {
    fn issue(&self, identity: &Identity, session_id: &SessionId) -> Result<AuthTokens, AuthError>;

    fn verify(&self, token: &str, expected: TokenType) -> Result<TokenClaims, TokenError>;

    /// Like [`TokenCodec::verify`] but accepts tokens past their expiry.
    fn verify_allow_expired(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<TokenClaims, TokenError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Fails with [`AuthError::InvalidCredentials`] for an unknown email and for
    /// a wrong password alike.
    async fn verify(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`AuthError::Conflict`] when the email is taken.
    async fn create(&self, input: RegisterInput) -> Result<Identity, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<AuthResult, AuthError>;
    async fn register(&self, request: RegisterInput) -> Result<AuthResult, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResult, AuthError>;
    /// [`AuthService::refresh`] on behalf of an authenticated caller; a refresh
    /// token belonging to anyone else is [`AuthError::Unauthorized`].
    async fn refresh_as(&self, caller: UserId, refresh_token: &str)
    -> Result<AuthResult, AuthError>;
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;
    async fn logout_as(&self, caller: UserId, refresh_token: &str) -> Result<(), AuthError>;
    async fn verify_access(&self, access_token: &str) -> Result<Identity, AuthError>;
}
