//! Contact and note endpoints.
//!
//! All routes are vault-scoped: the gate authorises the vault in the
//! path, and every contact lookup is additionally checked against that
//! vault, so a contact id belonging to another vault is a 404.

use axum::extract::{Path, RawPathParams, Request, State};
use axum::middleware::{self, Next};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::permission::{vault_gate, VaultContext, VaultPermission};
use crate::state::AppState;
use crate::store::{Contact, Note};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/vaults/{vault_id}/contacts", get(list_contacts).post(create_contact))
        .route(
            "/vaults/{vault_id}/contacts/{contact_id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route(
            "/vaults/{vault_id}/contacts/{contact_id}/notes",
            get(list_notes).post(create_note),
        )
        .layer(middleware::from_fn_with_state(
            state,
            |state: State<AppState>, params: RawPathParams, req: Request, next: Next| async move {
                vault_gate(VaultPermission::Viewer, state, params, req, next).await
            },
        ))
}

/// GET /vaults/:vault_id/contacts
async fn list_contacts(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.store.contacts_in_vault(ctx.vault_id)))
}

#[derive(Deserialize)]
pub struct CreateContactRequest {
    pub first_name: String,
    pub last_name: Option<String>,
}

/// POST /vaults/:vault_id/contacts - requires editor
async fn create_contact(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Json(req): Json<CreateContactRequest>,
) -> Result<Json<Contact>, ApiError> {
    ctx.require(VaultPermission::Editor)?;
    if req.first_name.trim().is_empty() {
        return Err(ApiError::Validation("first_name must not be empty".into()));
    }

    let contact = Contact {
        id: Uuid::new_v4(),
        vault_id: ctx.vault_id,
        first_name: req.first_name,
        last_name: req.last_name,
        created_at: Utc::now(),
    };
    state.store.insert_contact(contact.clone());

    if let Some(pool) = &state.db {
        db::contacts::insert_contact(pool, &contact).await?;
    }

    Ok(Json(contact))
}

/// GET /vaults/:vault_id/contacts/:contact_id
async fn get_contact(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Contact>, ApiError> {
    state
        .store
        .contact_in_vault(ctx.vault_id, contact_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("contact".into()))
}

#[derive(Deserialize)]
pub struct UpdateContactRequest {
    pub first_name: Option<String>,
    pub last_name: Option<Option<String>>,
}

/// PUT /vaults/:vault_id/contacts/:contact_id - requires editor
async fn update_contact(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, contact_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<Contact>, ApiError> {
    ctx.require(VaultPermission::Editor)?;
    let mut contact = state
        .store
        .contact_in_vault(ctx.vault_id, contact_id)
        .ok_or_else(|| ApiError::NotFound("contact".into()))?;

    if let Some(first_name) = req.first_name {
        if first_name.trim().is_empty() {
            return Err(ApiError::Validation("first_name must not be empty".into()));
        }
        contact.first_name = first_name;
    }
    // Double option: absent leaves the field alone, null clears it.
    if let Some(last_name) = req.last_name {
        contact.last_name = last_name;
    }
    state.store.insert_contact(contact.clone());

    if let Some(pool) = &state.db {
        db::contacts::update_contact(pool, &contact).await?;
    }

    Ok(Json(contact))
}

/// DELETE /vaults/:vault_id/contacts/:contact_id - requires editor
async fn delete_contact(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ctx.require(VaultPermission::Editor)?;
    if !state.store.delete_contact(ctx.vault_id, contact_id) {
        return Err(ApiError::NotFound("contact".into()));
    }

    if let Some(pool) = &state.db {
        db::contacts::delete_contact(pool, contact_id).await?;
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// GET /vaults/:vault_id/contacts/:contact_id/notes
async fn list_notes(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<Note>>, ApiError> {
    state
        .store
        .contact_in_vault(ctx.vault_id, contact_id)
        .ok_or_else(|| ApiError::NotFound("contact".into()))?;
    Ok(Json(state.store.notes_for_contact(ctx.vault_id, contact_id)))
}

#[derive(Deserialize)]
pub struct CreateNoteRequest {
    pub body: String,
}

/// POST /vaults/:vault_id/contacts/:contact_id/notes - requires editor
async fn create_note(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, contact_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    ctx.require(VaultPermission::Editor)?;
    state
        .store
        .contact_in_vault(ctx.vault_id, contact_id)
        .ok_or_else(|| ApiError::NotFound("contact".into()))?;

    let note = Note {
        id: Uuid::new_v4(),
        vault_id: ctx.vault_id,
        contact_id,
        body: req.body,
        created_at: Utc::now(),
    };
    state.store.insert_note(note.clone());

    if let Some(pool) = &state.db {
        db::contacts::insert_note(pool, &note).await?;
    }

    Ok(Json(note))
}
