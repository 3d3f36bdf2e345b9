//! HTTP route modules.
//!
//! Each module exposes a `router(state)` that the app assembles. Routers
//! that touch vault-scoped data attach the permission gate at their
//! weakest tier; handlers enforce stricter per-operation tiers through
//! `VaultContext::require`.

pub mod contacts;
pub mod dates;
pub mod reminders;
pub mod vaults;
