//! Full refresh of the contact cache by draining every page.

use std::collections::HashSet;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::gateway::ContactGateway;
use crate::cache::ContactCache;
use crate::error::ApiError;

/// Fetch every page of contacts, following cursors until the last page, and
/// build a fresh cache from them.
///
/// Pages are requested strictly in order. A contact whose email already
/// appeared on an earlier page replaces it. Contacts without an email address
/// are skipped with a warning. A cursor the server already handed out ends the
/// drain with [`ApiError::PaginationLoop`].
pub async fn drain_contacts<G>(
    gateway: &G,
    cancel: &CancellationToken,
) -> Result<ContactCache, ApiError>
where
    G: ContactGateway + ?Sized,
{
    let mut cache = ContactCache::new();
    let mut followed = HashSet::new();
    let mut pages = 1usize;
    let mut skipped = 0usize;

    let mut page = gateway.first_page(cancel).await?;
    loop {
        tracing::debug!(page = pages, contacts = page.contacts.len(), "fetched contacts page");

        for contact in page.contacts {
            if let Err(e) = cache.insert(contact) {
                skipped += 1;
                tracing::warn!("{e}, skipping");
            }
        }

        if page.next.is_empty() {
            break;
        }
        if !followed.insert(page.next.clone()) {
            return Err(ApiError::PaginationLoop { cursor: page.next });
        }

        page = gateway.page(&page.next, cancel).await?;
        pages += 1;
    }

    cache.mark_synced(Utc::now());
    tracing::info!(pages, contacts = cache.len(), skipped, "contact collection drained");
    Ok(cache)
}
