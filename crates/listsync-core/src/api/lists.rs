//! Lists resource.
//!
//! API docs: http://developer.constantcontact.com/docs/contact-list-api/contactlist-collection.html

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use super::client::Client;
use super::response::Response;
use super::types::ContactList;
use crate::error::{ApiError, OperationContext};

/// Typed calls against `lists`.
pub struct ListService<'a> {
    client: &'a Client,
}

impl<'a> ListService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// All contact lists. The listing is a bare array, never paginated.
    pub async fn get_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(Vec<ContactList>, Response), ApiError> {
        async {
            let req = self.client.build_request::<()>(Method::GET, "lists", None)?;
            let (lists, resp) = self.client.execute::<Vec<ContactList>>(req, cancel).await?;
            Ok::<_, ApiError>((lists.unwrap_or_default(), resp))
        }
        .await
        .during("get lists")
    }

    pub async fn create(
        &self,
        list: &ContactList,
        cancel: &CancellationToken,
    ) -> Result<(ContactList, Response), ApiError> {
        async {
            let req = self.client.build_request(Method::POST, "lists", Some(list))?;
            let (created, resp) = self.client.execute::<ContactList>(req, cancel).await?;
            Ok::<_, ApiError>((created.unwrap_or_default(), resp))
        }
        .await
        .during("create list")
    }

    /// Delete a list. The service answers with an empty body.
    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<Response, ApiError> {
        async {
            let req = self
                .client
                .build_request::<()>(Method::DELETE, &format!("lists/{id}"), None)?;
            self.client.execute_empty(req, cancel).await
        }
        .await
        .during(&format!("delete list {id}"))
    }
}
