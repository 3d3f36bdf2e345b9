//! Important-date endpoints.
//!
//! An important date is a labelled `(day, month, year?)` tuple on a
//! contact, recorded in some calendar. Responses include the next
//! Gregorian occurrence computed by the resolver.

use axum::extract::{Path, RawPathParams, Request, State};
use axum::middleware::{self, Next};
use axum::routing::{delete, get};
use axum::{Extension, Json, Router};
use chrono::Utc;
use kith_core::{CalendarType, GregorianDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::permission::{vault_gate, VaultContext, VaultPermission};
use crate::state::AppState;
use crate::store::ImportantDate;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/vaults/{vault_id}/contacts/{contact_id}/dates",
            get(list_dates).post(create_date),
        )
        .route(
            "/vaults/{vault_id}/contacts/{contact_id}/dates/{date_id}",
            delete(delete_date),
        )
        .layer(middleware::from_fn_with_state(
            state,
            |state: State<AppState>, params: RawPathParams, req: Request, next: Next| async move {
                vault_gate(VaultPermission::Viewer, state, params, req, next).await
            },
        ))
}

#[derive(Serialize, Deserialize)]
pub struct ImportantDateView {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub label: String,
    pub original_day: i32,
    pub original_month: i32,
    pub original_year: Option<i32>,
    pub calendar_type: CalendarType,
    pub next_occurrence: Option<GregorianDate>,
}

fn view(state: &AppState, date: &ImportantDate) -> ImportantDateView {
    let today = Utc::now().date_naive();
    let next = state
        .resolver
        .next_occurrence(&date.original(), date.calendar_type, today)
        .map_err(|err| {
            tracing::warn!(date_id = %date.id, "could not resolve next occurrence: {err}");
            err
        })
        .ok();

    ImportantDateView {
        id: date.id,
        contact_id: date.contact_id,
        label: date.label.clone(),
        original_day: date.original_day,
        original_month: date.original_month,
        original_year: (date.original_year != 0).then_some(date.original_year),
        calendar_type: date.calendar_type,
        next_occurrence: next,
    }
}

/// GET /vaults/:vault_id/contacts/:contact_id/dates
async fn list_dates(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<ImportantDateView>>, ApiError> {
    state
        .store
        .contact_in_vault(ctx.vault_id, contact_id)
        .ok_or_else(|| ApiError::NotFound("contact".into()))?;

    let views = state
        .store
        .dates_for_contact(ctx.vault_id, contact_id)
        .iter()
        .map(|d| view(&state, d))
        .collect();
    Ok(Json(views))
}

#[derive(Deserialize)]
pub struct CreateDateRequest {
    pub label: String,
    pub original_day: i32,
    /// Signed: negative marks a leap month.
    pub original_month: i32,
    #[serde(default)]
    pub original_year: Option<i32>,
    pub calendar_type: CalendarType,
}

/// POST /vaults/:vault_id/contacts/:contact_id/dates - requires editor
async fn create_date(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, contact_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateDateRequest>,
) -> Result<Json<ImportantDateView>, ApiError> {
    ctx.require(VaultPermission::Editor)?;
    state
        .store
        .contact_in_vault(ctx.vault_id, contact_id)
        .ok_or_else(|| ApiError::NotFound("contact".into()))?;

    let date = ImportantDate {
        id: Uuid::new_v4(),
        vault_id: ctx.vault_id,
        contact_id,
        label: req.label,
        original_day: req.original_day,
        original_month: req.original_month,
        original_year: req.original_year.unwrap_or(0),
        calendar_type: req.calendar_type,
    };

    // Reject dates the resolver cannot schedule instead of storing them.
    state
        .resolver
        .next_occurrence(&date.original(), date.calendar_type, Utc::now().date_naive())?;

    state.store.insert_date(date.clone());
    if let Some(pool) = &state.db {
        db::contacts::insert_date(pool, &date).await?;
    }

    Ok(Json(view(&state, &date)))
}

/// DELETE /vaults/:vault_id/contacts/:contact_id/dates/:date_id - requires editor
async fn delete_date(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, _, date_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ctx.require(VaultPermission::Editor)?;
    if !state.store.delete_date(ctx.vault_id, date_id) {
        return Err(ApiError::NotFound("important date".into()));
    }

    if let Some(pool) = &state.db {
        db::contacts::delete_date(pool, date_id).await?;
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
