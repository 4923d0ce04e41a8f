//! # Listsync Core Library
//!
//! Keeps a Constant Contact marketing list in step with a race registration
//! spreadsheet. The `listsync` CLI is a thin shell over this library.
//!
//! ## Architecture
//!
//! - **API client**: authenticated JSON requests against the v2 API with
//!   cursor pagination and cancellation
//! - **Cache**: a JSON snapshot of every remote contact, keyed by email
//! - **Sync**: drains the remote collection into the cache and reconciles a
//!   registration set against it
//! - **Source**: registration `.xlsx` exports and their download directory
//!
//! ## Key Components
//!
//! - [`Client`]: transport client with [`ContactService`] and [`ListService`]
//! - [`ContactCache`] / [`CacheStore`]: snapshot and its file
//! - [`Reconciler`]: create-or-update pass over a [`RegistrationSet`]
//! - [`Settings`]: TOML configuration

pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod source;
pub mod sync;

pub use api::{Client, Contact, ContactList, ContactService, ListService, Response};
pub use cache::{CacheStore, ContactCache};
pub use config::{ClientConfig, ListsConfig, Settings};
pub use credentials::Credentials;
pub use error::{ApiError, CacheError, ConfigError, CoreError, Result, SourceError};
pub use source::RegistrationSet;
pub use sync::{drain_contacts, ContactGateway, ReconcileError, ReconcileReport, Reconciler};
