//! Transport client for the Constant Contact v2 API.
//!
//! Builds authenticated requests relative to a base URL, runs them under a
//! cancellation token and decodes the buffered body. Resource-specific calls
//! live in [`ContactService`] and [`ListService`].

use std::time::Duration;

use reqwest::{header, Method, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::contacts::ContactService;
use super::lists::ListService;
use super::response::{self, Response};
use crate::config::ClientConfig;
use crate::error::ApiError;

/// Versioned API root. Must keep its trailing slash.
pub const DEFAULT_BASE_URL: &str = "https://api.constantcontact.com/v2/";

/// Sent with every request.
pub const USER_AGENT: &str = concat!("listsync/", env!("CARGO_PKG_VERSION"));

const API_KEY_PARAM: &str = "api_key";

/// API client. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    access_token: String,
}

/// Fully read response, before payload decode.
struct Buffered {
    response: Response,
    body: Vec<u8>,
}

impl Client {
    /// Create a client from explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ApiError::Configuration(format!("cannot parse base URL {:?}: {e}", config.base_url))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key,
            access_token: config.access_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Contacts resource.
    pub fn contacts(&self) -> ContactService<'_> {
        ContactService::new(self)
    }

    /// Lists resource.
    pub fn lists(&self) -> ListService<'_> {
        ListService::new(self)
    }

    /// Build a request for `path`, resolved against the base URL.
    ///
    /// `path` may be relative (`contacts/12`) or absolute (`/v2/contacts?next=..`,
    /// as handed back in pagination cursors). The API key query parameter is
    /// always set exactly once. `body` is sent as JSON when present.
    pub fn build_request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request, ApiError>
    where
        B: Serialize + ?Sized,
    {
        if !self.base_url.path().ends_with('/') {
            return Err(ApiError::Configuration(format!(
                "base URL must have a trailing slash, but {:?} does not",
                self.base_url.as_str()
            )));
        }

        let mut url = self.base_url.join(path).map_err(|source| ApiError::Url {
            path: path.to_string(),
            source,
        })?;

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != API_KEY_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair(API_KEY_PARAM, &self.api_key);

        let mut builder = self
            .http
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(header::USER_AGENT, USER_AGENT);

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(ApiError::Encoding)?;
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(bytes);
        }

        builder.build().map_err(ApiError::Transport)
    }

    /// Send `request` and decode its payload as `T`.
    ///
    /// An empty body is a success without a value. The pagination cursor is
    /// read independently of `T`, so a malformed `meta` block never fails the call.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<(Option<T>, Response), ApiError> {
        let buffered = self.fetch(request, cancel).await?;
        let payload = response::decode_payload(&buffered.body)?;
        Ok((payload, buffered.response))
    }

    /// Send `request`, ignoring any payload.
    pub async fn execute_empty(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response, ApiError> {
        Ok(self.fetch(request, cancel).await?.response)
    }

    async fn fetch(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Buffered, ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        tracing::debug!(method = %request.method(), path = request.url().path(), "sending request");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = self.http.execute(request) => result,
        };
        let resp = match result {
            Ok(resp) => resp,
            // a cancelled token explains the failure better than the transport
            Err(_) if cancel.is_cancelled() => return Err(ApiError::Cancelled),
            Err(e) => return Err(ApiError::Transport(e)),
        };

        let status = resp.status();

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            body = resp.bytes() => body.map_err(|e| {
                if cancel.is_cancelled() {
                    ApiError::Cancelled
                } else {
                    ApiError::Transport(e)
                }
            })?,
        };

        if !status.is_success() {
            return Err(response::status_error(status, &body));
        }

        let next = response::next_link(&body);

        Ok(Buffered {
            response: Response {
                status,
                next,
            },
            body: body.to_vec(),
        })
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
