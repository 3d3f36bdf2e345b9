//! Vault and vault-membership endpoints.

use axum::extract::{Path, RawPathParams, Request, State};
use axum::middleware::{self, Next};
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::permission::{vault_gate, VaultContext, VaultPermission};
use crate::state::AppState;
use crate::store::Vault;

pub fn router(state: AppState) -> Router<AppState> {
    let vault_level = Router::new()
        .route("/vaults/{id}", get(get_vault))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, params: RawPathParams, req: Request, next: Next| async move {
                vault_gate(VaultPermission::Viewer, state, params, req, next).await
            },
        ));

    let membership = Router::new()
        .route(
            "/vaults/{id}/users/{user_id}",
            put(upsert_grant).delete(revoke_grant),
        )
        .layer(middleware::from_fn_with_state(
            state,
            |state: State<AppState>, params: RawPathParams, req: Request, next: Next| async move {
                vault_gate(VaultPermission::Manager, state, params, req, next).await
            },
        ));

    Router::new()
        .route("/vaults", get(list_vaults).post(create_vault))
        .merge(vault_level)
        .merge(membership)
}

/// The `/vaults` collection is not scoped to a single vault, so the gate
/// does not apply; the two-factor check still does.
fn require_full_auth(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.two_factor_pending {
        return Err(ApiError::TwoFactorPending);
    }
    Ok(())
}

/// GET /vaults - vaults the caller holds any grant on
async fn list_vaults(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Vault>>, ApiError> {
    require_full_auth(&auth)?;
    Ok(Json(state.store.vaults_for_user(auth.user_id)))
}

#[derive(Deserialize)]
pub struct CreateVaultRequest {
    pub name: String,
}

/// POST /vaults - create a vault; the creator becomes its manager
async fn create_vault(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateVaultRequest>,
) -> Result<Json<Vault>, ApiError> {
    require_full_auth(&auth)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("vault name must not be empty".into()));
    }

    let vault = Vault {
        id: Uuid::new_v4(),
        name: req.name,
        created_at: Utc::now(),
    };
    state.store.insert_vault(vault.clone());
    state
        .store
        .upsert_grant(vault.id, auth.user_id, VaultPermission::Manager);

    if let Some(pool) = &state.db {
        db::vaults::insert_vault(pool, &vault).await?;
        db::vaults::upsert_grant(pool, vault.id, auth.user_id, VaultPermission::Manager as u16 as i16)
            .await?;
    }

    Ok(Json(vault))
}

/// GET /vaults/:id
async fn get_vault(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
) -> Result<Json<Vault>, ApiError> {
    state
        .store
        .vault(ctx.vault_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("vault".into()))
}

#[derive(Deserialize)]
pub struct GrantRequest {
    pub permission: VaultPermission,
}

/// PUT /vaults/:id/users/:user_id - grant or change a permission tier
async fn upsert_grant(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<GrantRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.upsert_grant(ctx.vault_id, user_id, req.permission);

    if let Some(pool) = &state.db {
        db::vaults::upsert_grant(pool, ctx.vault_id, user_id, req.permission as u16 as i16).await?;
    }

    Ok(Json(serde_json::json!({
        "vault_id": ctx.vault_id,
        "user_id": user_id,
        "permission": req.permission,
    })))
}

/// DELETE /vaults/:id/users/:user_id - revoke a grant
async fn revoke_grant(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.revoke_grant(ctx.vault_id, user_id) {
        return Err(ApiError::NotFound("grant".into()));
    }

    if let Some(pool) = &state.db {
        db::vaults::delete_grant(pool, ctx.vault_id, user_id).await?;
    }

    Ok(Json(serde_json::json!({ "revoked": true })))
}
