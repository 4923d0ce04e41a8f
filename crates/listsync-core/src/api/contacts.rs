//! Contacts resource.
//!
//! API docs: http://developer.constantcontact.com/docs/contacts-api/contacts-collection.html

use reqwest::Method;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::client::Client;
use super::response::Response;
use super::types::{BulkImport, Contact, ImportResponse, MAX_CUSTOM_FIELDS};
use crate::error::{ApiError, OperationContext};

/// Listing pages wrap contacts in a `results` array.
#[derive(Deserialize)]
struct ResultsPage {
    #[serde(default)]
    results: Vec<Contact>,
}

/// Typed calls against `contacts` and `activities/addcontacts`.
pub struct ContactService<'a> {
    client: &'a Client,
}

impl<'a> ContactService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a contact; the returned contact carries the server-assigned ID.
    pub async fn create(
        &self,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<(Contact, Response), ApiError> {
        async {
            validate(contact)?;
            let req = self
                .client
                .build_request(Method::POST, "contacts", Some(contact))?;
            let (created, resp) = self.client.execute::<Contact>(req, cancel).await?;
            Ok::<_, ApiError>((created.unwrap_or_default(), resp))
        }
        .await
        .during("create contact")
    }

    /// First page of contacts.
    pub async fn get_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(Vec<Contact>, Response), ApiError> {
        self.fetch_page("contacts", cancel)
            .await
            .during("get contacts")
    }

    /// Page addressed by a cursor from a previous [`Response::next`].
    pub async fn get_page(
        &self,
        cursor: &str,
        cancel: &CancellationToken,
    ) -> Result<(Vec<Contact>, Response), ApiError> {
        self.fetch_page(cursor, cancel)
            .await
            .during("get contacts page")
    }

    /// Replace the remote contact addressed by `contact.id`.
    pub async fn update(
        &self,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<(Contact, Response), ApiError> {
        async {
            let id = contact
                .remote_id()
                .ok_or(ApiError::MissingId { resource: "contact" })?;
            validate(contact)?;
            let req = self.client.build_request(
                Method::PUT,
                &format!("contacts/{id}"),
                Some(contact),
            )?;
            let (updated, resp) = self.client.execute::<Contact>(req, cancel).await?;
            Ok::<_, ApiError>((updated.unwrap_or_default(), resp))
        }
        .await
        .during("update contact")
    }

    /// Queue a bulk add-contacts activity. Returns once the job is accepted.
    ///
    /// API docs: http://developer.constantcontact.com/docs/bulk_activities_api/bulk-activities-import-contacts.html
    pub async fn import(
        &self,
        import: &BulkImport,
        cancel: &CancellationToken,
    ) -> Result<(ImportResponse, Response), ApiError> {
        async {
            let req =
                self.client
                    .build_request(Method::POST, "activities/addcontacts", Some(import))?;
            let (ack, resp) = self.client.execute::<ImportResponse>(req, cancel).await?;
            Ok::<_, ApiError>((ack.unwrap_or_default(), resp))
        }
        .await
        .during("bulk import contacts")
    }

    async fn fetch_page(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<(Vec<Contact>, Response), ApiError> {
        let req = self.client.build_request::<()>(Method::GET, path, None)?;
        let (page, resp) = self.client.execute::<ResultsPage>(req, cancel).await?;
        Ok((page.map(|p| p.results).unwrap_or_default(), resp))
    }
}

fn validate(contact: &Contact) -> Result<(), ApiError> {
    if contact.primary_email().is_none() {
        return Err(ApiError::Validation(
            "contact needs at least one email address".to_string(),
        ));
    }
    if contact.custom_fields.len() > MAX_CUSTOM_FIELDS {
        return Err(ApiError::Validation(format!(
            "contact has {} custom fields, at most {MAX_CUSTOM_FIELDS} are allowed",
            contact.custom_fields.len()
        )));
    }
    Ok(())
}
