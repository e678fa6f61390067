use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_signing_key: Vec<u8>,
    pub refresh_signing_key: Vec<u8>,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id as string
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sid: Option<String>, // refresh tokens only
    typ: TokenType,
    iat: i64,
    exp: i64,
    iss: String,
    aud: String,
    jti: String, // keeps two tokens minted in the same second distinct
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        KeyPair {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HS256 codec with one secret per token type, so a token of one type can
/// never verify as the other.
pub struct JwtHs256Codec {
    cfg: JwtConfig,
    access_keys: KeyPair,
    refresh_keys: KeyPair,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Result<Self, AuthError> {
        if cfg.access_signing_key.is_empty() || cfg.refresh_signing_key.is_empty() {
            return Err(AuthError::InternalError(
                "jwt signing keys must not be empty".to_string(),
            ));
        }
        if cfg.access_signing_key == cfg.refresh_signing_key {
            return Err(AuthError::InternalError(
                "access and refresh signing keys must differ".to_string(),
            ));
        }
        let access_keys = KeyPair::from_secret(&cfg.access_signing_key);
        let refresh_keys = KeyPair::from_secret(&cfg.refresh_signing_key);
        Ok(JwtHs256Codec {
            cfg,
            access_keys,
            refresh_keys,
        })
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn keys(&self, token_type: TokenType) -> &KeyPair {
        match token_type {
            TokenType::Access => &self.access_keys,
            TokenType::Refresh => &self.refresh_keys,
        }
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.keys(claims.typ).encoding,
        )
        .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    fn build_claims(
        &self,
        identity: &Identity,
        session_id: Option<&SessionId>,
        typ: TokenType,
        iat_dt: DateTime<Utc>,
        exp_dt: DateTime<Utc>,
    ) -> Claims {
        Claims {
            sub: identity.user_id.to_string(),
            email: identity.email.clone(),
            sid: session_id.map(|s| s.0.clone()),
            typ,
            iat: iat_dt.timestamp(),
            exp: exp_dt.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: Self::gen_jti(),
        }
    }

    fn decode_with(
        &self,
        token: &str,
        token_type: TokenType,
        validate_exp: bool,
    ) -> jsonwebtoken::errors::Result<Claims> {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 0;
        v.validate_exp = validate_exp;
        v.set_audience(&[self.cfg.audience.clone()]);
        v.set_issuer(&[self.cfg.issuer.clone()]);
        decode::<Claims>(token, &self.keys(token_type).decoding, &v).map(|data| data.claims)
    }

    fn verify_with(
        &self,
        token: &str,
        expected: TokenType,
        validate_exp: bool,
    ) -> Result<TokenClaims, TokenError> {
        match self.decode_with(token, expected, validate_exp) {
            Ok(claims) if claims.typ == expected => Self::into_token_claims(claims),
            Ok(_) => Err(TokenError::WrongType),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                ErrorKind::InvalidSignature => {
                    // Only an authentic token of the other type counts as a type
                    // mismatch; anything else is just a bad signature.
                    let other = expected.other();
                    match self.decode_with(token, other, false) {
                        Ok(claims) if claims.typ == other => Err(TokenError::WrongType),
                        _ => Err(TokenError::InvalidSignature),
                    }
                }
                _ => Err(TokenError::InvalidSignature),
            },
        }
    }

    fn into_token_claims(claims: Claims) -> Result<TokenClaims, TokenError> {
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenError::InvalidSignature)?;
        let session_id = claims.sid.map(SessionId);
        if claims.typ == TokenType::Refresh && session_id.is_none() {
            return Err(TokenError::InvalidSignature);
        }
        let issued_at =
            DateTime::<Utc>::from_timestamp(claims.iat, 0).ok_or(TokenError::InvalidSignature)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(TokenError::InvalidSignature)?;
        Ok(TokenClaims {
            subject: Identity {
                user_id,
                email: claims.email,
            },
            session_id,
            token_type: claims.typ,
            issued_at,
            expires_at,
        })
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue(&self, identity: &Identity, session_id: &SessionId) -> Result<AuthTokens, AuthError> {
        let iat_dt = Utc::now();
        let access_exp = iat_dt + self.cfg.access_ttl;
        let refresh_exp = iat_dt + self.cfg.refresh_ttl;

        let access = self.build_claims(identity, None, TokenType::Access, iat_dt, access_exp);
        let refresh = self.build_claims(
            identity,
            Some(session_id),
            TokenType::Refresh,
            iat_dt,
            refresh_exp,
        );

        Ok(AuthTokens {
            access_token: AccessToken(self.encode_claims(&access)?),
            refresh_token: RefreshToken(self.encode_claims(&refresh)?),
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<TokenClaims, TokenError> {
        self.verify_with(token, expected, true)
    }

    fn verify_allow_expired(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<TokenClaims, TokenError> {
        self.verify_with(token, expected, false)
    }
}
