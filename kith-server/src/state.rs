//! Shared application state.

use kith_core::RecurrenceResolver;
use sqlx::PgPool;

use crate::store::VaultStore;

#[derive(Clone)]
pub struct AppState {
    pub store: VaultStore,
    pub resolver: RecurrenceResolver,
    /// Present when `DATABASE_URL` is configured; mutations write through.
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(db: Option<PgPool>) -> Self {
        AppState {
            store: VaultStore::new(),
            // The registry is built once here, before any request exists,
            // and is immutable afterwards.
            resolver: RecurrenceResolver::default(),
            db,
        }
    }
}
