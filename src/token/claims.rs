use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Role;

/// Which secret a token is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Access,
    Refresh,
}

pub(crate) trait TokenClaims: Serialize + DeserializeOwned {
    const KIND: TokenKind;

    /// Expiry as a unix timestamp in seconds.
    fn expires_at(&self) -> i64;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AccessClaims {
    pub(crate) sub: i32,
    pub(crate) role: Role,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

impl TokenClaims for AccessClaims {
    const KIND: TokenKind = TokenKind::Access;

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RefreshClaims {
    pub(crate) jti: Uuid,
    pub(crate) sub: i32,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

impl TokenClaims for RefreshClaims {
    const KIND: TokenKind = TokenKind::Refresh;

    fn expires_at(&self) -> i64 {
        self.exp
    }
}
