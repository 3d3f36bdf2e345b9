//! Vault-scoped records and the in-memory store.
//!
//! The store is the authoritative working set: maps behind `RwLock`s,
//! shared through `AppState`. When Postgres is configured the `db` module
//! loads it at startup and route handlers write mutations through; without
//! a database the server runs memory-only (development and tests).
//!
//! Every record carries its owning `vault_id` and lookups are always
//! vault-scoped, so an id that exists in another vault behaves exactly
//! like one that does not exist at all.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kith_core::{CalendarType, DateInfo};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::permission::VaultPermission;

/// Tenant boundary: a collection of contacts and related records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub vault_id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub vault_id: Uuid,
    pub contact_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A labelled `(day, month, year?)` tuple attached to a contact,
/// recorded in some calendar. Recurs yearly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportantDate {
    pub id: Uuid,
    pub vault_id: Uuid,
    pub contact_id: Uuid,
    pub label: String,
    pub original_day: i32,
    /// Signed: negative marks a leap month.
    pub original_month: i32,
    /// 0 when the origin year is unknown.
    pub original_year: i32,
    pub calendar_type: CalendarType,
}

impl ImportantDate {
    pub fn original(&self) -> DateInfo {
        DateInfo::new(self.original_day, self.original_month, self.original_year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    OneTime,
    Recurring,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::OneTime => "one_time",
            ReminderKind::Recurring => "recurring",
        }
    }
}

/// An important date augmented with scheduling state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub vault_id: Uuid,
    pub contact_id: Option<Uuid>,
    pub title: String,
    pub kind: ReminderKind,
    /// Every N years for recurring reminders; None means every year.
    pub frequency_number: Option<i32>,
    pub original_day: i32,
    pub original_month: i32,
    pub original_year: i32,
    pub calendar_type: CalendarType,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn original(&self) -> DateInfo {
        DateInfo::new(self.original_day, self.original_month, self.original_year)
    }
}

#[derive(Default)]
struct Inner {
    tokens: RwLock<HashMap<String, AuthUser>>,
    vaults: RwLock<HashMap<Uuid, Vault>>,
    /// Grant rows keyed by `(vault_id, user_id)`, matching the persisted shape.
    grants: RwLock<HashMap<(Uuid, Uuid), VaultPermission>>,
    contacts: RwLock<HashMap<Uuid, Contact>>,
    notes: RwLock<HashMap<Uuid, Note>>,
    dates: RwLock<HashMap<Uuid, ImportantDate>>,
    reminders: RwLock<HashMap<Uuid, Reminder>>,
}

/// Cloneable handle to the shared in-memory store.
#[derive(Clone, Default)]
pub struct VaultStore {
    inner: Arc<Inner>,
}

impl VaultStore {
    pub fn new() -> Self {
        VaultStore::default()
    }

    // -- Tokens --

    pub fn insert_token(&self, token: &str, user: AuthUser) {
        self.inner.tokens.write().insert(token.to_string(), user);
    }

    pub fn token_user(&self, token: &str) -> Option<AuthUser> {
        self.inner.tokens.read().get(token).copied()
    }

    // -- Vaults --

    pub fn insert_vault(&self, vault: Vault) {
        self.inner.vaults.write().insert(vault.id, vault);
    }

    pub fn vault(&self, id: Uuid) -> Option<Vault> {
        self.inner.vaults.read().get(&id).cloned()
    }

    /// Vaults the user holds any grant on.
    pub fn vaults_for_user(&self, user_id: Uuid) -> Vec<Vault> {
        let grants = self.inner.grants.read();
        let vaults = self.inner.vaults.read();
        let mut out: Vec<Vault> = grants
            .keys()
            .filter(|(_, u)| *u == user_id)
            .filter_map(|(v, _)| vaults.get(v).cloned())
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }

    // -- Grants --

    pub fn grant(&self, vault_id: Uuid, user_id: Uuid) -> Option<VaultPermission> {
        self.inner.grants.read().get(&(vault_id, user_id)).copied()
    }

    pub fn upsert_grant(&self, vault_id: Uuid, user_id: Uuid, permission: VaultPermission) {
        self.inner
            .grants
            .write()
            .insert((vault_id, user_id), permission);
    }

    pub fn revoke_grant(&self, vault_id: Uuid, user_id: Uuid) -> bool {
        self.inner.grants.write().remove(&(vault_id, user_id)).is_some()
    }

    // -- Contacts --

    pub fn insert_contact(&self, contact: Contact) {
        self.inner.contacts.write().insert(contact.id, contact);
    }

    /// A contact is only visible through its own vault.
    pub fn contact_in_vault(&self, vault_id: Uuid, contact_id: Uuid) -> Option<Contact> {
        self.inner
            .contacts
            .read()
            .get(&contact_id)
            .filter(|c| c.vault_id == vault_id)
            .cloned()
    }

    pub fn contacts_in_vault(&self, vault_id: Uuid) -> Vec<Contact> {
        let mut out: Vec<Contact> = self
            .inner
            .contacts
            .read()
            .values()
            .filter(|c| c.vault_id == vault_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }

    pub fn delete_contact(&self, vault_id: Uuid, contact_id: Uuid) -> bool {
        let mut contacts = self.inner.contacts.write();
        match contacts.get(&contact_id) {
            Some(c) if c.vault_id == vault_id => {
                contacts.remove(&contact_id);
                self.inner
                    .notes
                    .write()
                    .retain(|_, n| n.contact_id != contact_id);
                self.inner
                    .dates
                    .write()
                    .retain(|_, d| d.contact_id != contact_id);
                true
            }
            _ => false,
        }
    }

    // -- Notes --

    pub fn insert_note(&self, note: Note) {
        self.inner.notes.write().insert(note.id, note);
    }

    pub fn notes_for_contact(&self, vault_id: Uuid, contact_id: Uuid) -> Vec<Note> {
        let mut out: Vec<Note> = self
            .inner
            .notes
            .read()
            .values()
            .filter(|n| n.vault_id == vault_id && n.contact_id == contact_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }

    // -- Important dates --

    pub fn insert_date(&self, date: ImportantDate) {
        self.inner.dates.write().insert(date.id, date);
    }

    pub fn dates_for_contact(&self, vault_id: Uuid, contact_id: Uuid) -> Vec<ImportantDate> {
        let mut out: Vec<ImportantDate> = self
            .inner
            .dates
            .read()
            .values()
            .filter(|d| d.vault_id == vault_id && d.contact_id == contact_id)
            .cloned()
            .collect();
        out.sort_by_key(|d| d.id);
        out
    }

    pub fn delete_date(&self, vault_id: Uuid, date_id: Uuid) -> bool {
        let mut dates = self.inner.dates.write();
        match dates.get(&date_id) {
            Some(d) if d.vault_id == vault_id => {
                dates.remove(&date_id);
                true
            }
            _ => false,
        }
    }

    // -- Reminders --

    pub fn insert_reminder(&self, reminder: Reminder) {
        self.inner.reminders.write().insert(reminder.id, reminder);
    }

    pub fn reminders_in_vault(&self, vault_id: Uuid) -> Vec<Reminder> {
        let mut out: Vec<Reminder> = self
            .inner
            .reminders
            .read()
            .values()
            .filter(|r| r.vault_id == vault_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }

    pub fn delete_reminder(&self, vault_id: Uuid, reminder_id: Uuid) -> bool {
        let mut reminders = self.inner.reminders.write();
        match reminders.get(&reminder_id) {
            Some(r) if r.vault_id == vault_id => {
                reminders.remove(&reminder_id);
                true
            }
            _ => false,
        }
    }
}
