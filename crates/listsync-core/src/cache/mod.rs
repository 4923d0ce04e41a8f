//! Local snapshot of the remote contact collection.
//!
//! The cache maps each contact's primary email to the contact as last seen
//! remotely. It is rebuilt wholesale by a full sync and never patched; its
//! `synced_at` stamp tells callers how stale it is.

pub mod store;

pub use store::CacheStore;

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::api::Contact;
use crate::error::CacheError;

/// Contacts keyed by primary email, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactCache {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    contacts: IndexMap<String, Contact>,
}

impl ContactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a contact under its primary email, returning the contact it replaced.
    ///
    /// # Errors
    ///
    /// `CacheError::Unindexable` if the contact has no email address.
    pub fn insert(&mut self, contact: Contact) -> Result<Option<Contact>, CacheError> {
        let key = contact
            .primary_email()
            .ok_or_else(|| CacheError::Unindexable {
                id: contact.id.clone(),
            })?
            .to_string();
        Ok(self.contacts.insert(key, contact))
    }

    pub fn get(&self, email: &str) -> Option<&Contact> {
        self.contacts.get(email)
    }

    pub fn contains(&self, email: &str) -> bool {
        self.contacts.contains_key(email)
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Contact)> {
        self.contacts.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    /// When the full sync that produced this snapshot finished.
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.synced_at = Some(at);
    }

    /// Time elapsed since the snapshot was taken, if it was ever stamped.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.synced_at.map(|at| now - at)
    }
}
