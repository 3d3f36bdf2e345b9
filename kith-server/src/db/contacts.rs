//! Contact, note, and important-date persistence.

use chrono::{DateTime, Utc};
use kith_core::CalendarType;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{Contact, ImportantDate, Note};

fn parse_calendar_type(raw: &str) -> Result<CalendarType, sqlx::Error> {
    raw.parse()
        .map_err(|e| sqlx::Error::Protocol(format!("bad calendar_type column: {e}")))
}

pub async fn load_contacts(pool: &PgPool) -> Result<Vec<Contact>, sqlx::Error> {
    let rows: Vec<(Uuid, Uuid, String, Option<String>, DateTime<Utc>)> =
        sqlx::query_as("SELECT id, vault_id, first_name, last_name, created_at FROM contacts")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, vault_id, first_name, last_name, created_at)| Contact {
            id,
            vault_id,
            first_name,
            last_name,
            created_at,
        })
        .collect())
}

pub async fn insert_contact(pool: &PgPool, contact: &Contact) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO contacts (id, vault_id, first_name, last_name, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(contact.id)
    .bind(contact.vault_id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(contact.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_contact(pool: &PgPool, contact: &Contact) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE contacts SET first_name = $2, last_name = $3 WHERE id = $1")
        .bind(contact.id)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .execute(pool)
        .await?;
    Ok(())
}

/// Notes and important dates cascade in SQL.
pub async fn delete_contact(pool: &PgPool, contact_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM contacts WHERE id = $1")
        .bind(contact_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_notes(pool: &PgPool) -> Result<Vec<Note>, sqlx::Error> {
    let rows: Vec<(Uuid, Uuid, Uuid, String, DateTime<Utc>)> =
        sqlx::query_as("SELECT id, vault_id, contact_id, body, created_at FROM notes")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, vault_id, contact_id, body, created_at)| Note {
            id,
            vault_id,
            contact_id,
            body,
            created_at,
        })
        .collect())
}

pub async fn insert_note(pool: &PgPool, note: &Note) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notes (id, vault_id, contact_id, body, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(note.id)
    .bind(note.vault_id)
    .bind(note.contact_id)
    .bind(&note.body)
    .bind(note.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_dates(pool: &PgPool) -> Result<Vec<ImportantDate>, sqlx::Error> {
    let rows: Vec<(Uuid, Uuid, Uuid, String, i32, i32, i32, String)> = sqlx::query_as(
        "SELECT id, vault_id, contact_id, label, original_day, original_month,
                original_year, calendar_type
         FROM important_dates",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter()
        .map(
            |(id, vault_id, contact_id, label, original_day, original_month, original_year, ct)| {
                Ok(ImportantDate {
                    id,
                    vault_id,
                    contact_id,
                    label,
                    original_day,
                    original_month,
                    original_year,
                    calendar_type: parse_calendar_type(&ct)?,
                })
            },
        )
        .collect()
}

pub async fn insert_date(pool: &PgPool, date: &ImportantDate) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO important_dates
             (id, vault_id, contact_id, label, original_day, original_month,
              original_year, calendar_type)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(date.id)
    .bind(date.vault_id)
    .bind(date.contact_id)
    .bind(&date.label)
    .bind(date.original_day)
    .bind(date.original_month)
    .bind(date.original_year)
    .bind(date.calendar_type.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_date(pool: &PgPool, date_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM important_dates WHERE id = $1")
        .bind(date_id)
        .execute(pool)
        .await?;
    Ok(())
}
