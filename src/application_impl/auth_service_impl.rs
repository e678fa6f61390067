use super::validation::{check_password, normalize_email};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::SessionStore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Log target for events that may indicate a stolen token.
pub const SECURITY_TARGET: &str = "security";

/// Short, non-reversible handle for a token so it can be correlated in logs.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

pub struct RealAuthService {
    credential_verifier: Arc<dyn CredentialVerifier>,
    user_store: Arc<dyn UserStore>,
    token_codec: Arc<dyn TokenCodec>,
    session_store: Arc<dyn SessionStore>,
    revoke_on_reuse: bool,
}

impl RealAuthService {
    pub fn new(
        credential_verifier: Arc<dyn CredentialVerifier>,
        user_store: Arc<dyn UserStore>,
        token_codec: Arc<dyn TokenCodec>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            credential_verifier,
            user_store,
            token_codec,
            session_store,
            revoke_on_reuse: false,
        }
    }

    /// Also drop the live session when a rotated-out refresh token shows up.
    pub fn with_revoke_on_reuse(mut self, revoke_on_reuse: bool) -> Self {
        self.revoke_on_reuse = revoke_on_reuse;
        self
    }

    /// Mint a pair under a fresh session id and make it the subject's only session.
    async fn start_session(&self, identity: Identity) -> Result<AuthResult, AuthError> {
        let session_id = SessionId::generate();
        let tokens = self.token_codec.issue(&identity, &session_id)?;
        self.session_store
            .put(
                identity.user_id,
                &session_id,
                tokens.refresh_token_expires_at,
            )
            .await?;

        tracing::debug!(user_id = %identity.user_id, "session started");
        Ok(AuthResult { identity, tokens })
    }

    fn verify_token(
        &self,
        token: &str,
        expected: TokenType,
        allow_expired: bool,
    ) -> Result<TokenClaims, AuthError> {
        let result = if allow_expired {
            self.token_codec.verify_allow_expired(token, expected)
        } else {
            self.token_codec.verify(token, expected)
        };
        result.map_err(|e| {
            tracing::debug!(
                token_type = %expected,
                token_fp = %token_fingerprint(token),
                reason = %e,
                "token rejected"
            );
            AuthError::from(e)
        })
    }

    /// The refresh token must belong to whoever holds the access token.
    fn check_caller(
        caller: Option<UserId>,
        claims: &TokenClaims,
        token: &str,
    ) -> Result<(), AuthError> {
        match caller {
            Some(caller) if caller != claims.subject.user_id => {
                tracing::warn!(
                    target: SECURITY_TARGET,
                    caller = %caller,
                    subject = %claims.subject.user_id,
                    token_fp = %token_fingerprint(token),
                    "refresh token presented by another subject"
                );
                Err(AuthError::Unauthorized)
            }
            _ => Ok(()),
        }
    }

    async fn rotate(
        &self,
        caller: Option<UserId>,
        refresh_token: &str,
    ) -> Result<AuthResult, AuthError> {
        let claims = self.verify_token(refresh_token, TokenType::Refresh, false)?;
        Self::check_caller(caller, &claims, refresh_token)?;
        let user_id = claims.subject.user_id;
        let presented = claims.session_id.ok_or(AuthError::Unauthorized)?;

        // Minting is pure, so do it before the swap; if the swap loses, the
        // new pair is simply dropped.
        let next = SessionId::generate();
        let tokens = self.token_codec.issue(&claims.subject, &next)?;

        let rotated = self
            .session_store
            .compare_and_rotate(user_id, &presented, &next, tokens.refresh_token_expires_at)
            .await?;

        if !rotated {
            tracing::warn!(
                target: SECURITY_TARGET,
                user_id = %user_id,
                token_fp = %token_fingerprint(refresh_token),
                revoke = self.revoke_on_reuse,
                "refresh token reuse or superseded session"
            );
            if self.revoke_on_reuse {
                self.session_store.delete(user_id).await?;
            }
            return Err(AuthError::SessionInvalid);
        }

        tracing::debug!(user_id = %user_id, "session rotated");
        Ok(AuthResult {
            identity: claims.subject,
            tokens,
        })
    }

    async fn terminate(
        &self,
        caller: Option<UserId>,
        refresh_token: &str,
    ) -> Result<(), AuthError> {
        let claims = self.verify_token(refresh_token, TokenType::Refresh, true)?;
        Self::check_caller(caller, &claims, refresh_token)?;
        let user_id = claims.subject.user_id;

        if self.session_store.delete(user_id).await? {
            tracing::info!(user_id = %user_id, "session terminated");
        } else {
            tracing::debug!(
                target: SECURITY_TARGET,
                user_id = %user_id,
                "logout for a session that no longer exists"
            );
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<AuthResult, AuthError> {
        let LoginInput { email, password } = request;
        // A malformed email is just another wrong credential here.
        let email = normalize_email(&email).map_err(|_| AuthError::InvalidCredentials)?;
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = self.credential_verifier.verify(&email, &password).await?;
        self.start_session(identity).await
    }

    async fn register(&self, request: RegisterInput) -> Result<AuthResult, AuthError> {
        let email = normalize_email(&request.email)?;
        check_password(&request.password)?;

        let identity = self
            .user_store
            .create(RegisterInput {
                email,
                password: request.password,
            })
            .await?;

        tracing::info!(user_id = %identity.user_id, "user registered");
        self.start_session(identity).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResult, AuthError> {
        self.rotate(None, refresh_token).await
    }

    async fn refresh_as(
        &self,
        caller: UserId,
        refresh_token: &str,
    ) -> Result<AuthResult, AuthError> {
        self.rotate(Some(caller), refresh_token).await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.terminate(None, refresh_token).await
    }

    async fn logout_as(&self, caller: UserId, refresh_token: &str) -> Result<(), AuthError> {
        self.terminate(Some(caller), refresh_token).await
    }

    async fn verify_access(&self, access_token: &str) -> Result<Identity, AuthError> {
        let claims = self.verify_token(access_token, TokenType::Access, false)?;
        Ok(claims.subject)
    }
}
