use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::PasscodeId;

/// PasscodeRequest - one issued passcode, stored as a hash
///
/// Rows are append-only. Expired rows stay in the table and are simply never
/// accepted again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasscodeRequest {
    pub id: PasscodeId,
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl PasscodeRequest {
    /// Expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl PasscodeRequest {
    pub async fn insert(
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PasscodeRequest>(
            r#"
            INSERT INTO passcode_requests (email, code_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Most recent unconsumed row for the e-mail, expired or not.
    pub async fn find_latest_active(
        email: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PasscodeRequest>(
            r#"
            SELECT * FROM passcode_requests
            WHERE email = $1 AND consumed = FALSE
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Flip `consumed` to true. Returns true only for the call that flipped it.
    pub async fn mark_consumed(id: PasscodeId, pool: &PgPool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE passcode_requests SET consumed = TRUE WHERE id = $1 AND consumed = FALSE",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Take one attempt if fewer than `max_attempts` have been used.
    ///
    /// Increment and limit check are one statement, so concurrent guesses can
    /// never take more than `max_attempts` between them. `None` means the row
    /// is locked (or gone).
    pub async fn reserve_attempt(
        id: PasscodeId,
        max_attempts: i32,
        pool: &PgPool,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE passcode_requests
            SET attempts = attempts + 1
            WHERE id = $1 AND attempts < $2
            RETURNING attempts
            "#,
        )
        .bind(id)
        .bind(max_attempts)
        .fetch_optional(pool)
        .await
    }
}
