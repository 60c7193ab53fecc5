use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::core::error::{ConfigError, Error, TokenError};
use crate::core::store::CredentialStore;
use crate::token::{RefreshClaims, RefreshRecord, TokenCodec};
use crate::types::Principal;
use crate::types::response::TokenPair;
use crate::utils::password;

/// Login, refresh and logout on top of a credential store and the token codec.
#[derive(Clone)]
pub(crate) struct SessionManager {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    store_timeout: Duration,
    // Compared against when the username is unknown, at the same bcrypt cost.
    decoy_hash: Arc<str>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub(crate) fn new(
        store: Arc<dyn CredentialStore>,
        codec: Arc<TokenCodec>,
        store_timeout: Duration,
        bcrypt_cost: u32,
    ) -> Result<Self, ConfigError> {
        let decoy_hash = bcrypt::hash(uuid::Uuid::new_v4().to_string(), bcrypt_cost)?;

        Ok(Self {
            store,
            codec,
            store_timeout,
            decoy_hash: decoy_hash.into(),
        })
    }

    pub(crate) async fn login(&self, username: &str, password: &str) -> Result<TokenPair, Error> {
        let principal = self
            .bounded(self.store.principal_by_username(username))
            .await?;

        // Unknown usernames pay for a comparison too, so latency does not reveal them.
        let hash = principal
            .as_ref()
            .map_or(&*self.decoy_hash, |principal| principal.password_hash.as_str());
        let password_matches = password::verify(password, hash).await?;

        let principal = match principal {
            Some(principal) if password_matches => principal,
            Some(principal) => {
                tracing::info!(principal_id = principal.id, "login rejected: password mismatch");
                return Err(Error::AuthenticationFailed);
            }
            None => {
                tracing::info!(username, "login rejected: unknown username");
                return Err(Error::AuthenticationFailed);
            }
        };

        let (tokens, record) = self.issue(&principal)?;

        self.bounded(self.store.persist_refresh_record(&record))
            .await?;

        tracing::info!(principal_id = principal.id, role = %principal.role, "admin logged in");

        Ok(tokens)
    }

    /// Exchanges a refresh token for a new pair. The presented token is consumed.
    pub(crate) async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, Error> {
        let claims: RefreshClaims = self
            .codec
            .verify(refresh_token)
            .map_err(Error::InvalidRefreshToken)?;

        if !self
            .bounded(self.store.refresh_record_exists(claims.sub, claims.jti))
            .await?
        {
            tracing::warn!(principal_id = claims.sub, token_id = %claims.jti, "refresh token revoked or superseded");
            return Err(Error::InvalidRefreshToken(TokenError::Revoked));
        }

        // The role is always re-read; it may have changed since the last login.
        let principal = match self.bounded(self.store.principal_by_id(claims.sub)).await? {
            Some(principal) => principal,
            None => {
                tracing::warn!(principal_id = claims.sub, "refresh for a deleted admin");
                return Err(Error::InvalidRefreshToken(TokenError::Revoked));
            }
        };

        let (tokens, record) = self.issue(&principal)?;

        if !self
            .bounded(self.store.rotate_refresh_record(claims.jti, &record))
            .await?
        {
            tracing::warn!(principal_id = claims.sub, token_id = %claims.jti, "refresh token consumed concurrently");
            return Err(Error::InvalidRefreshToken(TokenError::Revoked));
        }

        tracing::debug!(principal_id = principal.id, "refresh token rotated");

        Ok(tokens)
    }

    /// Revokes the refresh token. Expired tokens are accepted; unknown ones are a no-op.
    pub(crate) async fn logout(&self, refresh_token: &str) -> Result<(), Error> {
        let identity = self
            .codec
            .read_refresh_identity(refresh_token)
            .map_err(|_| Error::MalformedRefreshToken)?;

        self.bounded(
            self.store
                .delete_refresh_record(identity.sub, identity.jti),
        )
        .await?;

        tracing::info!(principal_id = identity.sub, "admin logged out");

        Ok(())
    }

    fn issue(&self, principal: &Principal) -> Result<(TokenPair, RefreshRecord), Error> {
        let access_token = self.codec.issue_access(principal)?;
        let (refresh_token, record) = self.codec.issue_refresh(principal)?;

        Ok((
            TokenPair {
                access_token,
                refresh_token,
            },
            record,
        ))
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(timeout = ?self.store_timeout, "credential store call timed out");
                Err(Error::StoreUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::AccessClaims;
    use crate::token::store::memory::{MemoryStore, principal};
    use crate::types::Role;
    use chrono::Utc;

    fn codec() -> Arc<TokenCodec> {
        Arc::new(
            TokenCodec::new(
                "session-access",
                "session-refresh",
                chrono::Duration::minutes(30),
                chrono::Duration::days(7),
            )
            .unwrap(),
        )
    }

    fn fixture() -> (Arc<MemoryStore>, Arc<TokenCodec>, SessionManager) {
        let store = Arc::new(MemoryStore::with_principals([
            principal(1, "alice", "correct horse", Role::Admin),
            principal(2, "root", "battery staple", Role::SuperAdmin),
        ]));
        let codec = codec();
        let session =
            SessionManager::new(store.clone(), codec.clone(), Duration::from_secs(5), 4).unwrap();
        (store, codec, session)
    }

    #[tokio::test]
    async fn login_issues_tokens_carrying_the_stored_role() {
        let (store, codec, session) = fixture();

        for (username, password, id, role) in [
            ("alice", "correct horse", 1, Role::Admin),
            ("root", "battery staple", 2, Role::SuperAdmin),
        ] {
            let tokens = session.login(username, password).await.unwrap();

            let access: AccessClaims = codec.verify(&tokens.access_token).unwrap();
            assert_eq!(access.sub, id);
            assert_eq!(access.role, role);

            let refresh: RefreshClaims = codec.verify(&tokens.refresh_token).unwrap();
            assert_eq!(store.records().await[&id].token_id, refresh.jti);
        }
    }

    #[tokio::test]
    async fn wrong_password_fails_without_touching_the_store() {
        let (store, _, session) = fixture();

        let err = session.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed));
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_indistinguishable_from_wrong_password() {
        let (store, _, session) = fixture();

        let unknown = session.login("mallory", "whatever").await.unwrap_err();
        let wrong = session.login("alice", "whatever").await.unwrap_err();
        assert_eq!(unknown.status_and_message(), wrong.status_and_message());
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn refresh_rotates_and_consumes_the_token() {
        let (store, codec, session) = fixture();
        let first = session.login("alice", "correct horse").await.unwrap();

        let second = session.refresh(&first.refresh_token).await.unwrap();
        let claims: RefreshClaims = codec.verify(&second.refresh_token).unwrap();
        assert_eq!(store.records().await[&1].token_id, claims.jti);

        let reused = session.refresh(&first.refresh_token).await.unwrap_err();
        assert!(matches!(
            reused,
            Error::InvalidRefreshToken(TokenError::Revoked)
        ));

        // The rotated token still works.
        session.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn logout_revokes_the_refresh_token() {
        let (store, _, session) = fixture();
        let tokens = session.login("alice", "correct horse").await.unwrap();

        session.logout(&tokens.refresh_token).await.unwrap();
        assert!(store.records().await.is_empty());

        let err = session.refresh(&tokens.refresh_token).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidRefreshToken(TokenError::Revoked)
        ));

        // Idempotent.
        session.logout(&tokens.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn logout_accepts_expired_tokens() {
        let (store, codec, session) = fixture();
        let alice = principal(1, "alice", "correct horse", Role::Admin);
        let (token, record) = codec
            .issue_refresh_at(&alice, Utc::now() - chrono::Duration::days(8))
            .unwrap();
        store.persist_refresh_record(&record).await.unwrap();

        session.logout(&token).await.unwrap();
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn logout_rejects_unreadable_tokens() {
        let (_, _, session) = fixture();

        let err = session.logout("definitely not a token").await.unwrap_err();
        assert!(matches!(err, Error::MalformedRefreshToken));
    }

    #[tokio::test]
    async fn logout_cannot_revoke_someone_elses_session() {
        let (store, codec, session) = fixture();
        session.login("alice", "correct horse").await.unwrap();

        // Same principal, different token id: nothing matches.
        let alice = principal(1, "alice", "correct horse", Role::Admin);
        let (stray, _) = codec.issue_refresh(&alice).unwrap();
        session.logout(&stray).await.unwrap();

        assert!(store.records().await.contains_key(&1));
    }

    #[tokio::test]
    async fn tampered_refresh_token_issues_nothing() {
        let (store, _, session) = fixture();
        let tokens = session.login("alice", "correct horse").await.unwrap();
        let before = store.records().await;

        let mut parts: Vec<String> = tokens
            .refresh_token
            .split('.')
            .map(str::to_owned)
            .collect();
        let other = session.login("root", "battery staple").await.unwrap();
        parts[1] = other.refresh_token.split('.').nth(1).unwrap().to_owned();
        let forged = parts.join(".");
        let before_forgery = store.records().await;

        let err = session.refresh(&forged).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidRefreshToken(TokenError::BadSignature)
        ));
        assert_eq!(store.records().await, before_forgery);
        assert_eq!(before_forgery[&1], before[&1]);
    }

    #[tokio::test]
    async fn access_token_cannot_be_used_to_refresh() {
        let (_, _, session) = fixture();
        let tokens = session.login("alice", "correct horse").await.unwrap();

        let err = session.refresh(&tokens.access_token).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidRefreshToken(TokenError::BadSignature)
        ));
    }

    #[tokio::test]
    async fn second_login_supersedes_the_first_refresh_token() {
        let (_, _, session) = fixture();
        let first = session.login("alice", "correct horse").await.unwrap();
        let second = session.login("alice", "correct horse").await.unwrap();

        assert!(matches!(
            session.refresh(&first.refresh_token).await.unwrap_err(),
            Error::InvalidRefreshToken(TokenError::Revoked)
        ));
        session.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_picks_up_role_changes() {
        let (store, codec, session) = fixture();
        let tokens = session.login("alice", "correct horse").await.unwrap();

        store.set_role(1, Role::SuperAdmin).await;

        let refreshed = session.refresh(&tokens.refresh_token).await.unwrap();
        let claims: AccessClaims = codec.verify(&refreshed.access_token).unwrap();
        assert_eq!(claims.role, Role::SuperAdmin);
    }

    #[tokio::test]
    async fn refresh_fails_for_deleted_admins() {
        let (store, _, session) = fixture();
        let tokens = session.login("alice", "correct horse").await.unwrap();

        store.remove_principal(1).await;

        assert!(matches!(
            session.refresh(&tokens.refresh_token).await.unwrap_err(),
            Error::InvalidRefreshToken(TokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn slow_store_fails_closed() {
        let store = Arc::new(
            MemoryStore::with_principals([principal(1, "alice", "correct horse", Role::Admin)])
                .with_latency(Duration::from_millis(500)),
        );
        let session = SessionManager::new(store, codec(), Duration::from_millis(20), 4).unwrap();

        let err = session.login("alice", "correct horse").await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable));
    }

    #[test]
    fn decoy_hash_uses_the_configured_cost() {
        let store = Arc::new(MemoryStore::default());
        let session = SessionManager::new(store, codec(), Duration::from_secs(5), 6).unwrap();

        assert!(session.decoy_hash.starts_with("$2b$06$"));
    }

    #[test]
    fn invalid_bcrypt_cost_is_a_startup_error() {
        let store = Arc::new(MemoryStore::default());

        assert!(SessionManager::new(store, codec(), Duration::from_secs(5), 99).is_err());
    }

    #[tokio::test]
    async fn unknown_username_costs_as_much_as_a_wrong_password() {
        const COST: u32 = 8;
        let store = Arc::new(MemoryStore::with_principals([Principal {
            id: 1,
            username: "alice".into(),
            password_hash: bcrypt::hash("correct horse", COST).unwrap(),
            role: Role::Admin,
        }]));
        let session = SessionManager::new(store, codec(), Duration::from_secs(5), COST).unwrap();

        let started = std::time::Instant::now();
        assert!(session.login("alice", "wrong horse").await.is_err());
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        assert!(session.login("mallory", "wrong horse").await.is_err());
        let unknown_username = started.elapsed();

        // Both run one bcrypt comparison at the same cost; allow generous jitter.
        assert!(
            unknown_username * 4 >= wrong_password,
            "unknown {:?} vs wrong {:?}",
            unknown_username,
            wrong_password
        );
    }
}
