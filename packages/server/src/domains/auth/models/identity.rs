use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::IdentityId;

/// Identity - a registered user, keyed by normalized e-mail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    pub id: IdentityId,
    pub name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Identity {
    /// Insert unless the e-mail already exists; always returns the stored row.
    ///
    /// An existing row is left untouched (name and phone are not overwritten).
    pub async fn upsert_if_absent(
        name: Option<&str>,
        email: &str,
        phone: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO identities (name, email, phone)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .execute(pool)
        .await?;

        // Separate statement so a row committed by a concurrent insert is visible.
        Self::find_by_email(email, pool)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(id: IdentityId, pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
