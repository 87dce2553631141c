//! Postgres-backed stores. Thin delegation to the queries in `domains/auth/models`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::{BaseIdentityStore, BasePasscodeStore, StoreError};
use crate::common::{IdentityId, PasscodeId};
use crate::domains::auth::models::{Identity, PasscodeRequest};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseIdentityStore for PostgresStore {
    async fn upsert_if_absent(
        &self,
        name: Option<&str>,
        email: &str,
        phone: Option<&str>,
    ) -> Result<Identity, StoreError> {
        Ok(Identity::upsert_if_absent(name, email, phone, &self.pool).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        Ok(Identity::find_by_email(email, &self.pool).await?)
    }

    async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        Ok(Identity::find_by_id(id, &self.pool).await?)
    }
}

#[async_trait]
impl BasePasscodeStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert(
        &self,
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasscodeRequest, StoreError> {
        Ok(PasscodeRequest::insert(email, code_hash, expires_at, &self.pool).await?)
    }

    async fn find_latest_active(
        &self,
        email: &str,
    ) -> Result<Option<PasscodeRequest>, StoreError> {
        Ok(PasscodeRequest::find_latest_active(email, &self.pool).await?)
    }

    async fn mark_consumed(&self, id: PasscodeId) -> Result<bool, StoreError> {
        Ok(PasscodeRequest::mark_consumed(id, &self.pool).await?)
    }

    async fn reserve_attempt(
        &self,
        id: PasscodeId,
        max_attempts: i32,
    ) -> Result<Option<i32>, StoreError> {
        Ok(PasscodeRequest::reserve_attempt(id, max_attempts, &self.pool).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
