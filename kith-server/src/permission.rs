//! Vault permission tiers and the per-request permission gate.
//!
//! Every route that touches vault-scoped data runs through [`vault_gate`].
//! Tiers are persisted as their numeric values, where a lower number is
//! more privileged; that ordering matches the stored rows and is kept
//! as-is for compatibility.

use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Permission tier a user holds inside a vault.
///
/// Serialized and persisted as the raw number. Required tier R is
/// satisfied by actual tier A iff A <= R.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum VaultPermission {
    Manager = 100,
    Editor = 200,
    Viewer = 300,
}

impl VaultPermission {
    /// Whether this tier satisfies a route's minimum requirement.
    pub fn satisfies(self, required: VaultPermission) -> bool {
        (self as u16) <= (required as u16)
    }
}

impl From<VaultPermission> for u16 {
    fn from(p: VaultPermission) -> u16 {
        p as u16
    }
}

impl TryFrom<u16> for VaultPermission {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            100 => Ok(VaultPermission::Manager),
            200 => Ok(VaultPermission::Editor),
            300 => Ok(VaultPermission::Viewer),
            other => Err(format!("unknown permission tier {other}")),
        }
    }
}

/// What the gate learned about the request, handed to handlers as an
/// extension. Handlers enforce stricter per-operation tiers through
/// [`VaultContext::require`]; the effective requirement of a stacked
/// route is the strictest one.
#[derive(Debug, Clone, Copy)]
pub struct VaultContext {
    pub vault_id: Uuid,
    pub permission: VaultPermission,
}

impl VaultContext {
    pub fn require(&self, tier: VaultPermission) -> Result<(), ApiError> {
        if self.permission.satisfies(tier) {
            Ok(())
        } else {
            Err(ApiError::InsufficientPermission)
        }
    }
}

/// Middleware enforcing a minimum tier on a vault-scoped route.
///
/// Rejection order: missing principal (401), two-factor pending (403,
/// checked before any grant lookup so a half-authenticated token never
/// touches vault data), no grant row (403), tier too weak (403). On
/// success the request gains a [`VaultContext`] extension.
///
/// Performs exactly one grant-store read per invocation; grants are
/// read-mostly and uncached, so admin-side changes apply on the next
/// request.
pub async fn vault_gate(
    min_required: VaultPermission,
    State(state): State<AppState>,
    params: RawPathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or(ApiError::Unauthorized)?;

    if auth.two_factor_pending {
        return Err(ApiError::TwoFactorPending);
    }

    // Vault-level routes use `id`; nested routes use `vault_id`.
    let raw = params
        .iter()
        .find(|(name, _)| *name == "vault_id")
        .or_else(|| params.iter().find(|(name, _)| *name == "id"))
        .map(|(_, value)| value)
        .ok_or_else(|| ApiError::Internal("gated route has no vault id parameter".into()))?;
    let vault_id = Uuid::parse_str(raw)
        .map_err(|_| ApiError::Validation(format!("'{raw}' is not a valid vault id")))?;

    let actual = state
        .store
        .grant(vault_id, auth.user_id)
        .ok_or(ApiError::NoVaultAccess)?;

    if !actual.satisfies(min_required) {
        return Err(ApiError::InsufficientPermission);
    }

    req.extensions_mut().insert(VaultContext {
        vault_id,
        permission: actual,
    });
    Ok(next.run(req).await)
}
