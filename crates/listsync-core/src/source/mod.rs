//! Where registrations come from: `.xlsx` exports of the registration site,
//! downloaded into a local directory.

pub mod exports;
pub mod registrations;

pub use exports::{download, latest_export};
pub use registrations::{RegistrationSet, EMAIL_COLUMN, FIRST_NAME_COLUMN, LAST_NAME_COLUMN};
