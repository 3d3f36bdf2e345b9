//! Reminder endpoints.
//!
//! The reminder wire format is part of the external contract: computed
//! `day`/`month`/`year` hold the next Gregorian occurrence, the
//! `original_*` fields echo the record with its signed month, and `type`
//! is `one_time` or `recurring`.

use axum::extract::{Path, RawPathParams, Request, State};
use axum::middleware::{self, Next};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use kith_core::CalendarType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::permission::{vault_gate, VaultContext, VaultPermission};
use crate::state::AppState;
use crate::store::{Reminder, ReminderKind};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/vaults/{vault_id}/reminders",
            get(list_reminders).post(create_reminder),
        )
        .route(
            "/vaults/{vault_id}/reminders/{reminder_id}",
            axum::routing::delete(delete_reminder),
        )
        .layer(middleware::from_fn_with_state(
            state,
            |state: State<AppState>, params: RawPathParams, req: Request, next: Next| async move {
                vault_gate(VaultPermission::Viewer, state, params, req, next).await
            },
        ))
}

/// Reminder as it appears on the wire.
#[derive(Serialize, Deserialize)]
pub struct ReminderView {
    pub id: Uuid,
    pub title: String,
    pub contact_id: Option<Uuid>,
    /// Next computed Gregorian occurrence; null when resolution failed.
    pub day: Option<i32>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub calendar_type: CalendarType,
    pub original_day: Option<i32>,
    pub original_month: Option<i32>,
    pub original_year: Option<i32>,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    pub frequency_number: Option<i32>,
}

fn view(state: &AppState, reminder: &Reminder) -> ReminderView {
    let today = Utc::now().date_naive();
    let original = reminder.original();

    // One-time reminders surface their recorded date; recurring ones get
    // the next occurrence from the resolver.
    let computed = match reminder.kind {
        ReminderKind::OneTime => state
            .resolver
            .to_gregorian(&original, reminder.calendar_type),
        ReminderKind::Recurring => {
            state
                .resolver
                .next_occurrence(&original, reminder.calendar_type, today)
        }
    };
    let computed = computed
        .map_err(|err| {
            tracing::warn!(reminder_id = %reminder.id, "could not schedule reminder: {err}");
            err
        })
        .ok();

    ReminderView {
        id: reminder.id,
        title: reminder.title.clone(),
        contact_id: reminder.contact_id,
        day: computed.map(|g| g.day as i32),
        month: computed.map(|g| g.month as i32),
        year: computed.map(|g| g.year),
        calendar_type: reminder.calendar_type,
        original_day: Some(reminder.original_day),
        original_month: Some(reminder.original_month),
        original_year: (reminder.original_year != 0).then_some(reminder.original_year),
        kind: reminder.kind,
        frequency_number: reminder.frequency_number,
    }
}

/// GET /vaults/:vault_id/reminders
async fn list_reminders(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
) -> Result<Json<Vec<ReminderView>>, ApiError> {
    let views = state
        .store
        .reminders_in_vault(ctx.vault_id)
        .iter()
        .map(|r| view(&state, r))
        .collect();
    Ok(Json(views))
}

#[derive(Deserialize)]
pub struct CreateReminderRequest {
    pub title: String,
    #[serde(default)]
    pub contact_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    #[serde(default)]
    pub frequency_number: Option<i32>,
    pub original_day: i32,
    /// Signed: negative marks a leap month.
    pub original_month: i32,
    #[serde(default)]
    pub original_year: Option<i32>,
    pub calendar_type: CalendarType,
}

/// POST /vaults/:vault_id/reminders - requires editor
async fn create_reminder(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Json(req): Json<CreateReminderRequest>,
) -> Result<Json<ReminderView>, ApiError> {
    ctx.require(VaultPermission::Editor)?;

    if let Some(contact_id) = req.contact_id {
        state
            .store
            .contact_in_vault(ctx.vault_id, contact_id)
            .ok_or_else(|| ApiError::NotFound("contact".into()))?;
    }

    let reminder = Reminder {
        id: Uuid::new_v4(),
        vault_id: ctx.vault_id,
        contact_id: req.contact_id,
        title: req.title,
        kind: req.kind,
        frequency_number: req.frequency_number,
        original_day: req.original_day,
        original_month: req.original_month,
        original_year: req.original_year.unwrap_or(0),
        calendar_type: req.calendar_type,
        created_at: Utc::now(),
    };

    // Reject reminders that can never fire instead of storing them.
    let original = reminder.original();
    match reminder.kind {
        ReminderKind::OneTime => {
            if reminder.original_year == 0 {
                return Err(ApiError::Validation(
                    "one_time reminders need an origin year".into(),
                ));
            }
            state
                .resolver
                .to_gregorian(&original, reminder.calendar_type)?;
        }
        ReminderKind::Recurring => {
            state.resolver.next_occurrence(
                &original,
                reminder.calendar_type,
                Utc::now().date_naive(),
            )?;
        }
    }

    state.store.insert_reminder(reminder.clone());
    if let Some(pool) = &state.db {
        db::reminders::insert_reminder(pool, &reminder).await?;
    }

    Ok(Json(view(&state, &reminder)))
}

/// DELETE /vaults/:vault_id/reminders/:reminder_id - requires editor
async fn delete_reminder(
    State(state): State<AppState>,
    Extension(ctx): Extension<VaultContext>,
    Path((_, reminder_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ctx.require(VaultPermission::Editor)?;
    if !state.store.delete_reminder(ctx.vault_id, reminder_id) {
        return Err(ApiError::NotFound("reminder".into()));
    }

    if let Some(pool) = &state.db {
        db::reminders::delete_reminder(pool, reminder_id).await?;
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
