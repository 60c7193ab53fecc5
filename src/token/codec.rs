use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::core::error::{ConfigError, Error, TokenError};
use crate::token::claims::{AccessClaims, RefreshClaims, TokenClaims, TokenKind};
use crate::token::store::RefreshRecord;
use crate::types::Principal;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Signs and verifies access and refresh tokens, each kind with its own secret.
#[derive(Clone)]
pub(crate) struct TokenCodec {
    access: Keys,
    refresh: Keys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub(crate) fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, ConfigError> {
        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        if access_secret == refresh_secret {
            return Err(ConfigError::SharedSecret);
        }

        if access_ttl <= Duration::zero() || refresh_ttl <= Duration::zero() {
            return Err(ConfigError::InvalidTtl);
        }

        // Expiry is checked by hand against an explicit clock, with no leeway.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            access: Keys::from_secret(access_secret),
            refresh: Keys::from_secret(refresh_secret),
            access_ttl,
            refresh_ttl,
            validation,
        })
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub(crate) fn issue_access(&self, principal: &Principal) -> Result<String, Error> {
        self.issue_access_at(principal, Utc::now())
    }

    pub(crate) fn issue_access_at(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<String, Error> {
        let claims = AccessClaims {
            sub: principal.id,
            role: principal.role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        self.sign(&claims)
    }

    pub(crate) fn issue_refresh(
        &self,
        principal: &Principal,
    ) -> Result<(String, RefreshRecord), Error> {
        self.issue_refresh_at(principal, Utc::now())
    }

    pub(crate) fn issue_refresh_at(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<(String, RefreshRecord), Error> {
        let expires_at = now + self.refresh_ttl;

        let claims = RefreshClaims {
            jti: Uuid::new_v4(),
            sub: principal.id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = self.sign(&claims)?;

        Ok((
            token,
            RefreshRecord {
                principal_id: principal.id,
                token_id: claims.jti,
                expires_at,
            },
        ))
    }

    fn sign<C: TokenClaims>(&self, claims: &C) -> Result<String, Error> {
        Ok(jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            claims,
            &self.keys(C::KIND).encoding,
        )?)
    }

    /// Verifies a token against the secret bound to `C`.
    pub(crate) fn verify<C: TokenClaims>(&self, token: &str) -> Result<C, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub(crate) fn verify_at<C: TokenClaims>(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<C, TokenError> {
        let header = jsonwebtoken::decode_header(token).map_err(|_| TokenError::Malformed)?;

        if header.alg != ALGORITHM {
            tracing::warn!(alg = ?header.alg, "rejected token with unexpected algorithm");
            return Err(TokenError::WrongAlgorithm);
        }

        let claims =
            jsonwebtoken::decode::<C>(token, &self.keys(C::KIND).decoding, &self.validation)
                .map_err(classify)?
                .claims;

        if now.timestamp() >= claims.expires_at() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Reads the identity of a refresh token without checking its signature or expiry.
    /// Only suitable for revocation, where the identity must match a stored record.
    pub(crate) fn read_refresh_identity(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<RefreshClaims>(token, &self.refresh.decoding, &validation)
            .map(|data| data.claims)
            .map_err(classify)
    }
}

fn classify(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::WrongAlgorithm
        }
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
