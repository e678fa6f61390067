use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Identity, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn other(self) -> TokenType {
        match self {
            TokenType::Access => TokenType::Refresh,
            TokenType::Refresh => TokenType::Access,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claims of a token whose signature has been verified.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub subject: Identity,
    /// Present on refresh tokens only.
    pub session_id: Option<SessionId>,
    pub token_type: TokenType,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
