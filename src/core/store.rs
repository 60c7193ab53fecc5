use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::core::error::Error;
use crate::token::RefreshRecord;
use crate::types::Principal;

/// Admin credentials and refresh-token records.
///
/// Refresh-record writes must be atomic per principal: each method is a single
/// statement (or equivalent), never a read followed by a write.
#[async_trait]
pub(crate) trait CredentialStore: Send + Sync {
    async fn principal_by_username(&self, username: &str) -> Result<Option<Principal>, Error>;

    async fn principal_by_id(&self, id: i32) -> Result<Option<Principal>, Error>;

    /// Stores `record` as the principal's only live refresh token.
    async fn persist_refresh_record(&self, record: &RefreshRecord) -> Result<(), Error>;

    /// True if `token_id` is the principal's live, unexpired refresh token.
    async fn refresh_record_exists(&self, principal_id: i32, token_id: Uuid)
    -> Result<bool, Error>;

    /// Replaces the record only if it still holds `previous`. Returns false when
    /// the previous token was already consumed or revoked.
    async fn rotate_refresh_record(
        &self,
        previous: Uuid,
        record: &RefreshRecord,
    ) -> Result<bool, Error>;

    /// Deletes the record if it holds `token_id`. Deleting nothing is not an error.
    async fn delete_refresh_record(&self, principal_id: i32, token_id: Uuid)
    -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub(crate) struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn principal_by_username(&self, username: &str) -> Result<Option<Principal>, Error> {
        Ok(sqlx::query(
            "SELECT id, username, password_hash, role
            FROM admins
            WHERE username = $1
            LIMIT 1;",
        )
        .bind(username)
        .try_map(map_principal)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn principal_by_id(&self, id: i32) -> Result<Option<Principal>, Error> {
        Ok(sqlx::query(
            "SELECT id, username, password_hash, role
            FROM admins
            WHERE id = $1
            LIMIT 1;",
        )
        .bind(id)
        .try_map(map_principal)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn persist_refresh_record(&self, record: &RefreshRecord) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO refresh_tokens (admin_id, token_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (admin_id) DO UPDATE SET
                token_id = EXCLUDED.token_id,
                expires_at = EXCLUDED.expires_at,
                created_at = now();",
        )
        .bind(record.principal_id)
        .bind(record.token_id)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn refresh_record_exists(
        &self,
        principal_id: i32,
        token_id: Uuid,
    ) -> Result<bool, Error> {
        Ok(sqlx::query(
            "SELECT EXISTS(
                SELECT 1 FROM refresh_tokens
                WHERE admin_id = $1 AND token_id = $2 AND expires_at > now()
            ) AS found;",
        )
        .bind(principal_id)
        .bind(token_id)
        .map(|row: PgRow| row.get("found"))
        .fetch_one(&self.pool)
        .await?)
    }

    async fn rotate_refresh_record(
        &self,
        previous: Uuid,
        record: &RefreshRecord,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens
            SET token_id = $3, expires_at = $4, created_at = now()
            WHERE admin_id = $1 AND token_id = $2;",
        )
        .bind(record.principal_id)
        .bind(previous)
        .bind(record.token_id)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_refresh_record(
        &self,
        principal_id: i32,
        token_id: Uuid,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM refresh_tokens WHERE admin_id = $1 AND token_id = $2;")
            .bind(principal_id)
            .bind(token_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn map_principal(row: PgRow) -> Result<Principal, sqlx::Error> {
    let role: String = row.try_get("role")?;

    Ok(Principal {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
    })
}
