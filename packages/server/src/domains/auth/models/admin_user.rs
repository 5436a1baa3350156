use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::AdminUserId;

/// An identity allowed into the content tools
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: String,
    pub display_name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    /// Find an active admin by id
    pub async fn find_active(id: AdminUserId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM admin_users WHERE id = $1 AND active = TRUE")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert or re-activate an admin
    pub async fn upsert(
        id: AdminUserId,
        email: &str,
        display_name: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO admin_users (id, email, display_name, active)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(display_name)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn deactivate(id: AdminUserId, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE admin_users SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
