//! List housekeeping: pruning stray lists and bulk enrolment into the
//! unregistered list.

use tokio_util::sync::CancellationToken;

use crate::api::{BulkImport, Client, ContactList, ImportRecord, ImportResponse};
use crate::cache::ContactCache;
use crate::config::ListsConfig;
use crate::error::ApiError;

/// Column set sent with every enrolment import.
pub const IMPORT_COLUMNS: [&str; 3] = ["EMAIL", "FIRST NAME", "LAST NAME"];

/// Lists found by a prune pass.
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// Reserved or unaddressable lists, left alone.
    pub kept: Vec<ContactList>,
    /// Lists deleted, or that would be deleted in a dry run.
    pub removed: Vec<ContactList>,
    pub dry_run: bool,
}

/// Lists that are not reserved, in server order. Lists without an ID cannot
/// be addressed and count as reserved.
pub fn non_reserved<'a>(lists: &'a [ContactList], reserved: &ListsConfig) -> Vec<&'a ContactList> {
    lists.iter().filter(|l| !is_protected(l, reserved)).collect()
}

fn is_protected(list: &ContactList, reserved: &ListsConfig) -> bool {
    list.id.as_deref().map_or(true, |id| reserved.is_reserved(id))
}

/// Delete every list except the reserved ones.
///
/// With `dry_run` nothing is deleted. Deletion stops at the first failure.
pub async fn prune_lists(
    client: &Client,
    reserved: &ListsConfig,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Result<PruneOutcome, ApiError> {
    let (lists, _) = client.lists().get_all(cancel).await?;
    let (kept, removed): (Vec<_>, Vec<_>) = lists
        .into_iter()
        .partition(|l| is_protected(l, reserved));

    if !dry_run {
        for (list, id) in removed.iter().filter_map(|l| l.id.as_deref().map(|id| (l, id))) {
            client.lists().delete(id, cancel).await?;
            tracing::info!(id, name = ?list.name, "deleted list");
        }
    }

    Ok(PruneOutcome {
        kept,
        removed,
        dry_run,
    })
}

/// Bulk import payload putting every cached contact on `list_id`.
pub fn enrollment_import(cache: &ContactCache, list_id: &str) -> BulkImport {
    let import_data = cache
        .iter()
        .map(|(email, contact)| ImportRecord {
            email_addresses: vec![email.to_string()],
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
        })
        .collect();

    BulkImport {
        import_data,
        column_names: IMPORT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        lists: vec![list_id.to_string()],
    }
}

/// Submit one bulk import adding every cached contact to the unregistered list.
///
/// The import runs asynchronously on the server; the returned acknowledgement
/// carries the job ID.
pub async fn enroll_cached(
    client: &Client,
    cache: &ContactCache,
    lists: &ListsConfig,
    cancel: &CancellationToken,
) -> Result<ImportResponse, ApiError> {
    if cache.is_empty() {
        return Err(ApiError::Validation(
            "contact cache is empty, nothing to enrol".to_string(),
        ));
    }

    let import = enrollment_import(cache, &lists.unregistered);
    let (ack, _) = client.contacts().import(&import, cancel).await?;
    tracing::info!(
        job = %ack.id,
        contacts = import.import_data.len(),
        list = %lists.unregistered,
        "bulk import queued"
    );
    Ok(ack)
}
