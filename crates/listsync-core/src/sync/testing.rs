//! In-memory gateway that records every call.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use super::gateway::{ContactGateway, Page};
use crate::api::Contact;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    FirstPage,
    Page(String),
    Create(Contact),
    Update(Contact),
}

#[derive(Default)]
struct State {
    first: Option<Page>,
    by_cursor: HashMap<String, Page>,
    remote: IndexMap<String, Contact>,
    rejected: HashMap<String, u16>,
    cancel_after: Option<(usize, CancellationToken)>,
    calls: Vec<Call>,
    next_id: u64,
}

/// Without scripted pages, listing returns the remote collection as one page.
#[derive(Default)]
pub(crate) struct RecordingGateway {
    state: Mutex<State>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(first: Page, rest: Vec<(&str, Page)>) -> Self {
        let gateway = Self::new();
        {
            let mut state = gateway.state.lock().unwrap();
            state.first = Some(first);
            state.by_cursor = rest
                .into_iter()
                .map(|(cursor, page)| (cursor.to_string(), page))
                .collect();
        }
        gateway
    }

    pub fn with_remote(contacts: impl IntoIterator<Item = Contact>) -> Self {
        let gateway = Self::new();
        {
            let mut state = gateway.state.lock().unwrap();
            for contact in contacts {
                let email = contact.primary_email().unwrap().to_string();
                state.remote.insert(email, contact);
            }
        }
        gateway
    }

    /// Reject creates and updates for `email` with `status`.
    pub fn rejecting(self, email: &str, status: u16) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejected
            .insert(email.to_string(), status);
        self
    }

    /// Cancel `token` once `calls` calls have been recorded.
    pub fn cancelling_after(self, calls: usize, token: CancellationToken) -> Self {
        self.state.lock().unwrap().cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn remote(&self, email: &str) -> Option<Contact> {
        self.state.lock().unwrap().remote.get(email).cloned()
    }

    fn record(&self, call: Call, cancel: &CancellationToken) -> Result<(), ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some((after, token)) = &state.cancel_after {
            if state.calls.len() >= *after {
                token.cancel();
            }
        }
        Ok(())
    }

    fn check_rejected(&self, contact: &Contact) -> Result<(), ApiError> {
        let state = self.state.lock().unwrap();
        match contact.primary_email().and_then(|e| state.rejected.get(e)) {
            Some(&status) => Err(ApiError::Status {
                status,
                message: "json.field.invalid: rejected".into(),
                details: vec![],
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContactGateway for RecordingGateway {
    async fn first_page(&self, cancel: &CancellationToken) -> Result<Page, ApiError> {
        self.record(Call::FirstPage, cancel)?;
        let state = self.state.lock().unwrap();
        Ok(match &state.first {
            Some(page) => page.clone(),
            None => Page {
                contacts: state.remote.values().cloned().collect(),
                next: String::new(),
            },
        })
    }

    async fn page(&self, cursor: &str, cancel: &CancellationToken) -> Result<Page, ApiError> {
        self.record(Call::Page(cursor.to_string()), cancel)?;
        let state = self.state.lock().unwrap();
        state
            .by_cursor
            .get(cursor)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                message: format!("no page for {cursor}"),
                details: vec![],
            })
    }

    async fn create(
        &self,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<Contact, ApiError> {
        self.record(Call::Create(contact.clone()), cancel)?;
        self.check_rejected(contact)?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut created = contact.clone();
        created.id = Some(format!("remote-{}", state.next_id));
        let email = created.primary_email().unwrap_or_default().to_string();
        state.remote.insert(email, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<Contact, ApiError> {
        self.record(Call::Update(contact.clone()), cancel)?;
        if contact.remote_id().is_none() {
            return Err(ApiError::MissingId { resource: "contact" });
        }
        self.check_rejected(contact)?;
        let mut state = self.state.lock().unwrap();
        let email = contact.primary_email().unwrap_or_default().to_string();
        state.remote.insert(email, contact.clone());
        Ok(contact.clone())
    }
}
