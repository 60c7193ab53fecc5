use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The one live refresh token of a principal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RefreshRecord {
    pub(crate) principal_id: i32,
    pub(crate) token_id: Uuid,
    pub(crate) expires_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod memory {
    use super::RefreshRecord;
    use crate::core::error::Error;
    use crate::core::store::CredentialStore;
    use crate::types::{Principal, Role};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    /// In-process credential store. Every method holds the lock for its whole body,
    /// which gives the same per-principal atomicity as the single-statement SQL.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        principals: Mutex<HashMap<i32, Principal>>,
        records: Mutex<HashMap<i32, RefreshRecord>>,
        latency: Option<Duration>,
    }

    impl MemoryStore {
        pub(crate) fn with_principals(principals: impl IntoIterator<Item = Principal>) -> Self {
            Self {
                principals: Mutex::new(principals.into_iter().map(|p| (p.id, p)).collect()),
                ..Self::default()
            }
        }

        pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        pub(crate) async fn set_role(&self, id: i32, role: Role) {
            if let Some(principal) = self.principals.lock().await.get_mut(&id) {
                principal.role = role;
            }
        }

        pub(crate) async fn remove_principal(&self, id: i32) {
            self.principals.lock().await.remove(&id);
        }

        pub(crate) async fn records(&self) -> HashMap<i32, RefreshRecord> {
            self.records.lock().await.clone()
        }

        async fn pause(&self) {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn principal_by_username(&self, username: &str) -> Result<Option<Principal>, Error> {
            self.pause().await;
            Ok(self
                .principals
                .lock()
                .await
                .values()
                .find(|p| p.username == username)
                .cloned())
        }

        async fn principal_by_id(&self, id: i32) -> Result<Option<Principal>, Error> {
            self.pause().await;
            Ok(self.principals.lock().await.get(&id).cloned())
        }

        async fn persist_refresh_record(&self, record: &RefreshRecord) -> Result<(), Error> {
            self.pause().await;
            self.records
                .lock()
                .await
                .insert(record.principal_id, record.clone());
            Ok(())
        }

        async fn refresh_record_exists(
            &self,
            principal_id: i32,
            token_id: Uuid,
        ) -> Result<bool, Error> {
            self.pause().await;
            Ok(self
                .records
                .lock()
                .await
                .get(&principal_id)
                .is_some_and(|r| r.token_id == token_id && r.expires_at > Utc::now()))
        }

        async fn rotate_refresh_record(
            &self,
            previous: Uuid,
            record: &RefreshRecord,
        ) -> Result<bool, Error> {
            self.pause().await;
            let mut records = self.records.lock().await;

            match records.get_mut(&record.principal_id) {
                Some(current) if current.token_id == previous => {
                    *current = record.clone();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn delete_refresh_record(
            &self,
            principal_id: i32,
            token_id: Uuid,
        ) -> Result<(), Error> {
            self.pause().await;
            let mut records = self.records.lock().await;

            if records
                .get(&principal_id)
                .is_some_and(|r| r.token_id == token_id)
            {
                records.remove(&principal_id);
            }

            Ok(())
        }
    }

    /// A principal whose password hash uses the cheapest bcrypt cost.
    pub(crate) fn principal(id: i32, username: &str, password: &str, role: Role) -> Principal {
        Principal {
            id,
            username: username.into(),
            password_hash: bcrypt::hash(password, 4).unwrap(),
            role,
        }
    }
}
