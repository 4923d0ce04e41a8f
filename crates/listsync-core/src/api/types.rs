//! Wire types for the contacts and lists resources.
//!
//! Every scalar is optional and omitted from JSON when absent, so a contact
//! decoded from the service and written back only carries what the service
//! sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Membership status the service uses for an active list subscription.
pub const ACTIVE: &str = "ACTIVE";

/// The service accepts at most this many custom fields per contact.
pub const MAX_CUSTOM_FIELDS: usize = 15;

/// A single contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<ListMembership>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_phone: Option<String>,
}

impl Contact {
    /// New contact with a single email address, as built from a registration row.
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email_addresses: vec![EmailAddress {
                email_address: Some(email.into()),
                ..EmailAddress::default()
            }],
            ..Self::default()
        }
    }

    /// Address of the first email entry; the contact's identity.
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .first()
            .and_then(|e| e.email_address.as_deref())
            .filter(|e| !e.is_empty())
    }

    /// Remote ID, if the contact has been created remotely.
    pub fn remote_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_member_of(&self, list_id: &str) -> bool {
        self.lists.iter().any(|l| l.id == list_id)
    }

    /// Copy of this contact subscribed to `list_id` with the given status.
    /// An existing entry for the list is replaced, other memberships are kept.
    pub fn with_membership(&self, list_id: &str, status: &str) -> Self {
        let mut derived = self.clone();
        let membership = ListMembership {
            id: list_id.to_string(),
            status: Some(status.to_string()),
        };
        match derived.lists.iter_mut().find(|l| l.id == list_id) {
            Some(existing) => *existing = membership,
            None => derived.lists.push(membership),
        }
        derived
    }

    /// Copy of this contact without a membership for `list_id`.
    pub fn without_membership(&self, list_id: &str) -> Self {
        let mut derived = self.clone();
        derived.lists.retain(|l| l.id != list_id);
        derived
    }
}

/// Postal address attached to a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_postal_code: Option<String>,
}

/// Free-form custom field (`CustomField1` .. `CustomField15`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Email address entry. The API only allows one per contact on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_in_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_in_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_out_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_out_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A list the contact belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMembership {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A remote contact list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_count: Option<u64>,
}

/// Bulk "add contacts" activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkImport {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_data: Vec<ImportRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<String>,
}

/// One row of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub email_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Acknowledgement of a queued bulk import job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub contact_count: u64,
}
