//! Vault, grant, and token persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::Vault;

pub async fn load_tokens(pool: &PgPool) -> Result<Vec<(String, Uuid, bool)>, sqlx::Error> {
    sqlx::query_as("SELECT token, user_id, two_factor_pending FROM api_tokens")
        .fetch_all(pool)
        .await
}

pub async fn load_vaults(pool: &PgPool) -> Result<Vec<Vault>, sqlx::Error> {
    let rows: Vec<(Uuid, String, DateTime<Utc>)> =
        sqlx::query_as("SELECT id, name, created_at FROM vaults")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, name, created_at)| Vault {
            id,
            name,
            created_at,
        })
        .collect())
}

pub async fn insert_vault(pool: &PgPool, vault: &Vault) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO vaults (id, name, created_at) VALUES ($1, $2, $3)")
        .bind(vault.id)
        .bind(&vault.name)
        .bind(vault.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_grants(pool: &PgPool) -> Result<Vec<(Uuid, Uuid, i16)>, sqlx::Error> {
    sqlx::query_as("SELECT vault_id, user_id, permission FROM vault_users")
        .fetch_all(pool)
        .await
}

/// Upsert a grant row. The referenced user row is created on demand;
/// user records proper are owned by the (external) account service.
pub async fn upsert_grant(
    pool: &PgPool,
    vault_id: Uuid,
    user_id: Uuid,
    permission: i16,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;
    sqlx::query(
        "INSERT INTO vault_users (vault_id, user_id, permission) VALUES ($1, $2, $3)
         ON CONFLICT (vault_id, user_id) DO UPDATE SET permission = EXCLUDED.permission",
    )
    .bind(vault_id)
    .bind(user_id)
    .bind(permission)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_grant(pool: &PgPool, vault_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM vault_users WHERE vault_id = $1 AND user_id = $2")
        .bind(vault_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
