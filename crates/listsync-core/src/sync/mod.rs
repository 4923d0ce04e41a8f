//! Sync engine: drains the remote contact collection into the cache and
//! reconciles a registration set against it.
//!
//! Remote calls go through [`ContactGateway`], implemented by
//! [`crate::api::Client`]. List housekeeping talks to the client directly.

pub mod drain;
pub mod gateway;
pub mod lists;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod testing;

pub use drain::drain_contacts;
pub use gateway::{ContactGateway, Page};
pub use lists::{enroll_cached, enrollment_import, non_reserved, prune_lists, PruneOutcome};
pub use reconcile::{
    plan, PlannedChange, ReconcileError, ReconcileReport, Reconciler, RecordFailure, SyncAction,
};
