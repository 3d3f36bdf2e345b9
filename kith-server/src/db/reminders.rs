//! Reminder persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{Reminder, ReminderKind};

#[derive(sqlx::FromRow)]
struct ReminderRow {
    id: Uuid,
    vault_id: Uuid,
    contact_id: Option<Uuid>,
    title: String,
    kind: String,
    frequency_number: Option<i32>,
    original_day: i32,
    original_month: i32,
    original_year: i32,
    calendar_type: String,
    created_at: DateTime<Utc>,
}

impl ReminderRow {
    fn into_record(self) -> Result<Reminder, sqlx::Error> {
        let kind = match self.kind.as_str() {
            "one_time" => ReminderKind::OneTime,
            "recurring" => ReminderKind::Recurring,
            other => {
                return Err(sqlx::Error::Protocol(format!(
                    "bad reminder kind column: {other}"
                )))
            }
        };
        Ok(Reminder {
            id: self.id,
            vault_id: self.vault_id,
            contact_id: self.contact_id,
            title: self.title,
            kind,
            frequency_number: self.frequency_number,
            original_day: self.original_day,
            original_month: self.original_month,
            original_year: self.original_year,
            calendar_type: self
                .calendar_type
                .parse()
                .map_err(|e| sqlx::Error::Protocol(format!("bad calendar_type column: {e}")))?,
            created_at: self.created_at,
        })
    }
}

pub async fn load_reminders(pool: &PgPool) -> Result<Vec<Reminder>, sqlx::Error> {
    let rows: Vec<ReminderRow> = sqlx::query_as(
        "SELECT id, vault_id, contact_id, title, kind, frequency_number,
                original_day, original_month, original_year, calendar_type, created_at
         FROM reminders",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ReminderRow::into_record).collect()
}

pub async fn insert_reminder(pool: &PgPool, reminder: &Reminder) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO reminders
             (id, vault_id, contact_id, title, kind, frequency_number,
              original_day, original_month, original_year, calendar_type, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(reminder.id)
    .bind(reminder.vault_id)
    .bind(reminder.contact_id)
    .bind(&reminder.title)
    .bind(reminder.kind.as_str())
    .bind(reminder.frequency_number)
    .bind(reminder.original_day)
    .bind(reminder.original_month)
    .bind(reminder.original_year)
    .bind(reminder.calendar_type.as_str())
    .bind(reminder.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_reminder(pool: &PgPool, reminder_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM reminders WHERE id = $1")
        .bind(reminder_id)
        .execute(pool)
        .await?;
    Ok(())
}
