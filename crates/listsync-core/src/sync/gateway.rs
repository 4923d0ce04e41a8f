//! The slice of the contacts resource the sync engine depends on.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::api::{Client, Contact};
use crate::error::ApiError;

/// One page of a contact listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub contacts: Vec<Contact>,
    /// Cursor for the following page; empty on the last page.
    pub next: String,
}

/// Remote contact operations used by draining and reconciliation.
#[async_trait]
pub trait ContactGateway: Send + Sync {
    /// First page of the collection.
    async fn first_page(&self, cancel: &CancellationToken) -> Result<Page, ApiError>;

    /// Page addressed by a cursor returned with a previous page.
    async fn page(&self, cursor: &str, cancel: &CancellationToken) -> Result<Page, ApiError>;

    async fn create(&self, contact: &Contact, cancel: &CancellationToken)
        -> Result<Contact, ApiError>;

    async fn update(&self, contact: &Contact, cancel: &CancellationToken)
        -> Result<Contact, ApiError>;
}

#[async_trait]
impl ContactGateway for Client {
    async fn first_page(&self, cancel: &CancellationToken) -> Result<Page, ApiError> {
        let (contacts, resp) = self.contacts().get_all(cancel).await?;
        Ok(Page {
            contacts,
            next: resp.next,
        })
    }

    async fn page(&self, cursor: &str, cancel: &CancellationToken) -> Result<Page, ApiError> {
        let (contacts, resp) = self.contacts().get_page(cursor, cancel).await?;
        Ok(Page {
            contacts,
            next: resp.next,
        })
    }

    async fn create(
        &self,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<Contact, ApiError> {
        let (created, _) = self.contacts().create(contact, cancel).await?;
        Ok(created)
    }

    async fn update(
        &self,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<Contact, ApiError> {
        let (updated, _) = self.contacts().update(contact, cancel).await?;
        Ok(updated)
    }
}
