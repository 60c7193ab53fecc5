use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::core::error::Error;
use crate::token::{AccessClaims, RefreshClaims, TokenCodec, TokenKind};
use crate::types::Role;

/// Roles admitted to a route group. Super admins are always admitted.
#[derive(Clone, Debug, Default)]
pub(crate) struct RolePolicy {
    allowed: Vec<Role>,
}

impl RolePolicy {
    pub(crate) fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub(crate) fn permits(&self, role: Role) -> bool {
        role.is_superuser() || self.allowed.contains(&role)
    }
}

/// The raw bearer token of an authorized request.
#[derive(Clone, Debug)]
pub(crate) struct BearerToken(pub(crate) String);

#[derive(Clone, Debug)]
pub(crate) enum Verified {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

/// Per-route-group gate. The kind of token it expects, and therefore the secret
/// used to verify it, comes from the route it guards, never from the token.
#[derive(Clone, Debug)]
pub(crate) struct Gate {
    codec: Arc<TokenCodec>,
    kind: TokenKind,
    policy: RolePolicy,
}

impl Gate {
    pub(crate) fn access(codec: Arc<TokenCodec>, policy: RolePolicy) -> Self {
        Self {
            codec,
            kind: TokenKind::Access,
            policy,
        }
    }

    pub(crate) fn refresh(codec: Arc<TokenCodec>) -> Self {
        Self {
            codec,
            kind: TokenKind::Refresh,
            policy: RolePolicy::default(),
        }
    }

    pub(crate) fn check(&self, token: &str) -> Result<Verified, Error> {
        match self.kind {
            TokenKind::Access => {
                let claims: AccessClaims = self.codec.verify(token)?;

                if !self.policy.permits(claims.role) {
                    tracing::warn!(principal_id = claims.sub, role = %claims.role, "insufficient role");
                    return Err(Error::Forbidden);
                }

                Ok(Verified::Access(claims))
            }
            TokenKind::Refresh => self
                .codec
                .verify(token)
                .map(Verified::Refresh)
                .map_err(Error::InvalidRefreshToken),
        }
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub(crate) async fn authorize(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = match bearer_token(request.headers()) {
        Some(token) => token.to_owned(),
        None => {
            tracing::debug!("missing or malformed authorization header");
            return Err(Error::NoCredentials);
        }
    };

    match gate.check(&token)? {
        Verified::Access(claims) => {
            request.extensions_mut().insert(claims);
        }
        Verified::Refresh(claims) => {
            request.extensions_mut().insert(claims);
        }
    }

    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}
