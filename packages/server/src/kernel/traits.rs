// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (passcode rules, lockout, token issuance) lives in domains/auth/actions.
//
// Naming convention: Base* for trait names (e.g., BasePasscodeStore, BaseNotifier)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{IdentityId, PasscodeId};
use crate::domains::auth::models::{Identity, PasscodeRequest};
use crate::kernel::notifications::{Channel, PasscodeMessage};

/// Storage-layer failure. The auth actions surface it as `ServiceUnavailable`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Identity Store Trait (Infrastructure - users keyed by e-mail)
// =============================================================================

#[async_trait]
pub trait BaseIdentityStore: Send + Sync {
    /// Insert if the e-mail is new; an existing row wins and is returned as is.
    async fn upsert_if_absent(
        &self,
        name: Option<&str>,
        email: &str,
        phone: Option<&str>,
    ) -> Result<Identity, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>, StoreError>;
}

// =============================================================================
// Passcode Store Trait (Infrastructure - append-only hashed codes)
// =============================================================================

#[async_trait]
pub trait BasePasscodeStore: Send + Sync {
    /// Append a new row. Earlier rows for the same e-mail are kept.
    async fn insert(
        &self,
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasscodeRequest, StoreError>;

    /// Most recently created unconsumed row; expiry is the caller's check.
    async fn find_latest_active(&self, email: &str)
        -> Result<Option<PasscodeRequest>, StoreError>;

    /// Compare-and-swap `consumed` false → true.
    ///
    /// Idempotent; returns true only for the caller that performed the swap,
    /// which is what gives at-most-once consumption under concurrent verifies.
    async fn mark_consumed(&self, id: PasscodeId) -> Result<bool, StoreError>;

    /// Atomic increment-and-compare on `attempts`: increments only while
    /// `attempts < max_attempts` and returns the new count, else `None`.
    async fn reserve_attempt(
        &self,
        id: PasscodeId,
        max_attempts: i32,
    ) -> Result<Option<i32>, StoreError>;

    /// Short backend label reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Cheap liveness check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// Notifier Trait (Infrastructure - e-mail / SMS delivery)
// =============================================================================

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// Channel this notifier delivers on; decides which address it receives.
    fn channel(&self) -> Channel;

    /// Deliver the passcode message to `address`.
    async fn send_passcode(&self, address: &str, message: &PasscodeMessage) -> Result<()>;
}

// =============================================================================
// Clock Trait (Infrastructure - current time, replaceable in tests)
// =============================================================================

pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
