//! In-process implementation of both stores.
//!
//! Used when no `DATABASE_URL` is configured and by the tests. Data lives as
//! long as the process. One mutex guards both tables, so every trait method
//! is a single critical section (the CAS in `mark_consumed` included).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::traits::{BaseIdentityStore, BasePasscodeStore, StoreError};
use crate::common::{IdentityId, PasscodeId};
use crate::domains::auth::models::{Identity, PasscodeRequest};

#[derive(Default)]
struct Tables {
    identities: Vec<Identity>,
    passcodes: Vec<PasscodeRequest>,
    next_identity_id: i64,
    next_passcode_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every passcode row ever inserted for `email`, oldest first.
    pub async fn passcodes_for(&self, email: &str) -> Vec<PasscodeRequest> {
        let tables = self.tables.lock().await;
        tables
            .passcodes
            .iter()
            .filter(|p| p.email == email)
            .cloned()
            .collect()
    }

    pub async fn identity_count(&self) -> usize {
        self.tables.lock().await.identities.len()
    }
}

#[async_trait]
impl BaseIdentityStore for MemoryStore {
    async fn upsert_if_absent(
        &self,
        name: Option<&str>,
        email: &str,
        phone: Option<&str>,
    ) -> Result<Identity, StoreError> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.identities.iter().find(|i| i.email == email) {
            return Ok(existing.clone());
        }

        tables.next_identity_id += 1;
        let identity = Identity {
            id: IdentityId(tables.next_identity_id),
            name: name.map(str::to_string),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.identities.push(identity.clone());
        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.identities.iter().find(|i| i.email == email).cloned())
    }

    async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.identities.iter().find(|i| i.id == id).cloned())
    }
}

#[async_trait]
impl BasePasscodeStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(
        &self,
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasscodeRequest, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.next_passcode_id += 1;
        let row = PasscodeRequest {
            id: PasscodeId(tables.next_passcode_id),
            email: email.to_string(),
            code_hash: code_hash.to_string(),
            expires_at,
            consumed: false,
            attempts: 0,
            created_at: Utc::now(),
        };
        tables.passcodes.push(row.clone());
        Ok(row)
    }

    async fn find_latest_active(
        &self,
        email: &str,
    ) -> Result<Option<PasscodeRequest>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .passcodes
            .iter()
            .filter(|p| p.email == email && !p.consumed)
            .max_by_key(|p| p.id)
            .cloned())
    }

    async fn mark_consumed(&self, id: PasscodeId) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.passcodes.iter_mut().find(|p| p.id == id) {
            Some(row) if !row.consumed => {
                row.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reserve_attempt(
        &self,
        id: PasscodeId,
        max_attempts: i32,
    ) -> Result<Option<i32>, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.passcodes.iter_mut().find(|p| p.id == id) {
            Some(row) if row.attempts < max_attempts => {
                row.attempts += 1;
                Ok(Some(row.attempts))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_upsert_keeps_existing_identity() {
        let store = MemoryStore::new();
        let first = store
            .upsert_if_absent(Some("Ana"), "ana@test.com", None)
            .await
            .unwrap();
        let second = store
            .upsert_if_absent(Some("Someone Else"), "ana@test.com", Some("+491512345678"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.name.as_deref(), Some("Ana"));
        assert_eq!(second.phone, None);
        assert_eq!(store.identity_count().await, 1);
    }

    #[tokio::test]
    async fn test_find_identity_by_id_and_email() {
        let store = MemoryStore::new();
        let ana = store
            .upsert_if_absent(None, "ana@test.com", None)
            .await
            .unwrap();

        assert_eq!(store.find_by_id(ana.id).await.unwrap(), Some(ana.clone()));
        assert_eq!(
            store.find_by_email("ana@test.com").await.unwrap(),
            Some(ana)
        );
        assert_eq!(store.find_by_id(IdentityId(999)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_latest_active_skips_consumed_and_ignores_expiry() {
        let store = MemoryStore::new();
        let past = Utc::now() - Duration::minutes(10);

        let old = store.insert("ana@test.com", "h1", past).await.unwrap();
        let newer = store.insert("ana@test.com", "h2", past).await.unwrap();
        store.insert("bob@test.com", "h3", past).await.unwrap();

        let latest = store.find_latest_active("ana@test.com").await.unwrap();
        assert_eq!(latest.map(|r| r.id), Some(newer.id));

        assert!(store.mark_consumed(newer.id).await.unwrap());
        let latest = store.find_latest_active("ana@test.com").await.unwrap();
        assert_eq!(latest.map(|r| r.id), Some(old.id));
    }

    #[tokio::test]
    async fn test_mark_consumed_swaps_once() {
        let store = MemoryStore::new();
        let row = store
            .insert("ana@test.com", "h", Utc::now())
            .await
            .unwrap();

        assert!(store.mark_consumed(row.id).await.unwrap());
        assert!(!store.mark_consumed(row.id).await.unwrap());
        assert!(store
            .find_latest_active("ana@test.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_attempts_are_capped() {
        let store = MemoryStore::new();
        let row = store
            .insert("ana@test.com", "h", Utc::now())
            .await
            .unwrap();

        assert_eq!(store.reserve_attempt(row.id, 2).await.unwrap(), Some(1));
        assert_eq!(store.reserve_attempt(row.id, 2).await.unwrap(), Some(2));
        assert_eq!(store.reserve_attempt(row.id, 2).await.unwrap(), None);
        assert_eq!(store.passcodes_for("ana@test.com").await[0].attempts, 2);
        assert_eq!(store.reserve_attempt(PasscodeId(404), 2).await.unwrap(), None);
    }
}
