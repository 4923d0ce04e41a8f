//! Constant Contact v2 API client.
//!
//! [`Client`] handles transport concerns; [`ContactService`] and
//! [`ListService`] are typed views onto the two resources the tool uses.

pub mod client;
pub mod contacts;
pub mod lists;
pub mod response;
pub mod types;


pub use client::{Client, DEFAULT_BASE_URL, USER_AGENT};
pub use contacts::ContactService;
pub use lists::ListService;
pub use response::Response;
pub use types::{
    Address, BulkImport, Contact, ContactList, CustomField, EmailAddress, ImportRecord,
    ImportResponse, ListMembership, ACTIVE, MAX_CUSTOM_FIELDS,
};
