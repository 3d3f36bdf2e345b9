//! Postgres persistence layer.
//!
//! Optional: when `DATABASE_URL` is set the server loads the working set
//! from Postgres at startup and route handlers write mutations through.
//! When absent, the server runs memory-only, which is what development
//! and the test suite use.
//!
//! Grant rows are `(vault_id, user_id, permission)` keyed by the pair;
//! the integer permission column is the external contract and maps onto
//! `VaultPermission` at the boundary.

pub mod contacts;
pub mod reminders;
pub mod vaults;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::auth::AuthUser;
use crate::permission::VaultPermission;
use crate::store::VaultStore;

/// Connect and run embedded migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (memory-only mode).
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set, running memory-only. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Populate the in-memory store from Postgres.
pub async fn load_store(pool: &PgPool, store: &VaultStore) -> Result<(), sqlx::Error> {
    for (token, user_id, two_factor_pending) in vaults::load_tokens(pool).await? {
        store.insert_token(
            &token,
            AuthUser {
                user_id,
                two_factor_pending,
            },
        );
    }
    for vault in vaults::load_vaults(pool).await? {
        store.insert_vault(vault);
    }
    for (vault_id, user_id, permission) in vaults::load_grants(pool).await? {
        match VaultPermission::try_from(permission as u16) {
            Ok(tier) => store.upsert_grant(vault_id, user_id, tier),
            Err(err) => {
                tracing::warn!(%vault_id, %user_id, "skipping grant row: {err}");
            }
        }
    }
    for contact in contacts::load_contacts(pool).await? {
        store.insert_contact(contact);
    }
    for note in contacts::load_notes(pool).await? {
        store.insert_note(note);
    }
    for date in contacts::load_dates(pool).await? {
        store.insert_date(date);
    }
    for reminder in reminders::load_reminders(pool).await? {
        store.insert_reminder(reminder);
    }
    Ok(())
}
