//! Registration reconciliation.
//!
//! Every registrant ends up subscribed to the registered list. Registrants the
//! cache already knows are updated from their cached copy, which moves them off
//! the unregistered list; unknown registrants are created.

use std::fmt;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::gateway::ContactGateway;
use crate::api::{Contact, ACTIVE};
use crate::cache::ContactCache;
use crate::config::ListsConfig;
use crate::error::ApiError;
use crate::source::RegistrationSet;

/// Remote mutation chosen for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Create,
    Update,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Create => write!(f, "create"),
            SyncAction::Update => write!(f, "update"),
        }
    }
}

/// A derived contact and the call that will submit it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub email: String,
    pub action: SyncAction,
    pub contact: Contact,
}

/// A record whose remote call failed.
#[derive(Error, Debug)]
#[error("{action} {email}: {error}")]
pub struct RecordFailure {
    pub email: String,
    pub action: SyncAction,
    pub error: ApiError,
}

/// Outcome of a reconciliation pass, by email.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub failures: Vec<RecordFailure>,
}

impl ReconcileReport {
    pub fn attempted(&self) -> usize {
        self.created.len() + self.updated.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A pass in which at least one record failed. The message names the last
/// failure; the full report keeps all of them in order.
#[derive(Error, Debug)]
#[error(
    "{} of {} records failed to sync, last: {}",
    .report.failures.len(),
    .report.attempted(),
    last_failure(.report)
)]
pub struct ReconcileError {
    pub report: ReconcileReport,
}

impl ReconcileError {
    pub fn failures(&self) -> &[RecordFailure] {
        &self.report.failures
    }

    pub fn last(&self) -> Option<&RecordFailure> {
        self.report.failures.last()
    }
}

fn last_failure(report: &ReconcileReport) -> String {
    report
        .failures
        .last()
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Pair every registrant with the create or update that would register it.
///
/// Known emails derive from the cached contact, keeping its remote ID and
/// fields; unknown emails derive from the registration record.
pub fn plan(
    registrations: &RegistrationSet,
    cache: &ContactCache,
    lists: &ListsConfig,
) -> Vec<PlannedChange> {
    registrations
        .iter()
        .map(|(email, record)| match cache.get(email) {
            Some(cached) => PlannedChange {
                email: email.to_string(),
                action: SyncAction::Update,
                contact: registered_copy(cached, lists),
            },
            None => PlannedChange {
                email: email.to_string(),
                action: SyncAction::Create,
                contact: record.with_membership(&lists.registered, ACTIVE),
            },
        })
        .collect()
}

fn registered_copy(cached: &Contact, lists: &ListsConfig) -> Contact {
    let patched = cached.with_membership(&lists.registered, ACTIVE);
    if lists.unregistered == lists.registered {
        return patched;
    }
    patched.without_membership(&lists.unregistered)
}

/// Applies a registration set to the remote contact collection.
pub struct Reconciler<'a, G: ContactGateway + ?Sized> {
    gateway: &'a G,
    lists: ListsConfig,
}

impl<'a, G: ContactGateway + ?Sized> Reconciler<'a, G> {
    pub fn new(gateway: &'a G, lists: ListsConfig) -> Self {
        Self { gateway, lists }
    }

    /// Decide, without any remote call, what each record turns into.
    pub fn plan(&self, registrations: &RegistrationSet, cache: &ContactCache) -> Vec<PlannedChange> {
        plan(registrations, cache, &self.lists)
    }

    /// Submit every record in order.
    ///
    /// A failing record does not stop the pass. Once `cancel` fires, the
    /// records not yet attempted are reported as cancelled.
    pub async fn reconcile(
        &self,
        registrations: &RegistrationSet,
        cache: &ContactCache,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport, ReconcileError> {
        self.apply(self.plan(registrations, cache), cancel).await
    }

    /// Submit already planned changes in order.
    pub async fn apply(
        &self,
        plan: Vec<PlannedChange>,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();

        for change in plan {
            let PlannedChange {
                email,
                action,
                contact,
            } = change;

            if cancel.is_cancelled() {
                report.failures.push(RecordFailure {
                    email,
                    action,
                    error: ApiError::Cancelled,
                });
                continue;
            }

            let result = match action {
                SyncAction::Create => self.gateway.create(&contact, cancel).await,
                SyncAction::Update => self.gateway.update(&contact, cancel).await,
            };

            match result {
                Ok(_) => {
                    tracing::info!(%email, %action, "synced contact");
                    match action {
                        SyncAction::Create => report.created.push(email),
                        SyncAction::Update => report.updated.push(email),
                    }
                }
                Err(error) => {
                    tracing::error!(%email, %action, "sync failed: {error}");
                    report.failures.push(RecordFailure {
                        email,
                        action,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            created = report.created.len(),
            updated = report.updated.len(),
            failed = report.failures.len(),
            "reconciliation finished"
        );

        if report.is_clean() {
            Ok(report)
        } else {
            Err(ReconcileError { report })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ListMembership;
    use crate::sync::drain_contacts;
    use crate::sync::testing::{Call, RecordingGateway};

    const REGISTERED: &str = "1756200534";
    const UNREGISTERED: &str = "1268645980";

    fn registrant(email: &str) -> Contact {
        let mut contact = Contact::with_email(email);
        contact.first_name = Some("Reg".into());
        contact
    }

    fn remote(email: &str, id: &str) -> Contact {
        let mut contact = Contact::with_email(email);
        contact.id = Some(id.into());
        contact.first_name = Some("Cached".into());
        contact.lists = vec![
            ListMembership {
                id: UNREGISTERED.into(),
                status: Some(ACTIVE.into()),
            },
            ListMembership {
                id: "42".into(),
                status: Some(ACTIVE.into()),
            },
        ];
        contact
    }

    fn cache_of(contacts: impl IntoIterator<Item = Contact>) -> ContactCache {
        let mut cache = ContactCache::new();
        for contact in contacts {
            cache.insert(contact).unwrap();
        }
        cache
    }

    fn registrations(emails: &[&str]) -> RegistrationSet {
        emails.iter().map(|e| registrant(e)).collect()
    }

    #[tokio::test]
    async fn routes_known_emails_to_update_and_others_to_create() {
        let gateway = RecordingGateway::new();
        let cache = cache_of([remote("known@x.com", "7")]);
        let set = registrations(&["new@x.com", "known@x.com"]);

        let report = Reconciler::new(&gateway, ListsConfig::default())
            .reconcile(&set, &cache, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.created, vec!["new@x.com"]);
        assert_eq!(report.updated, vec!["known@x.com"]);

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        let Call::Create(created) = &calls[0] else {
            panic!("expected create, got {:?}", calls[0]);
        };
        assert!(created.id.is_none());
        assert_eq!(created.first_name.as_deref(), Some("Reg"));
        assert!(created.is_member_of(REGISTERED));

        let Call::Update(updated) = &calls[1] else {
            panic!("expected update, got {:?}", calls[1]);
        };
        assert_eq!(updated.remote_id(), Some("7"));
        assert_eq!(updated.first_name.as_deref(), Some("Cached"));
        assert!(updated.is_member_of(REGISTERED));
        assert!(!updated.is_member_of(UNREGISTERED));
        assert!(updated.is_member_of("42"));
    }

    #[tokio::test]
    async fn inputs_are_left_untouched() {
        let gateway = RecordingGateway::new();
        let cache = cache_of([remote("known@x.com", "7")]);
        let set = registrations(&["new@x.com", "known@x.com"]);
        let cache_before = cache.clone();

        Reconciler::new(&gateway, ListsConfig::default())
            .reconcile(&set, &cache, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(cache, cache_before);
        assert!(set.get("new@x.com").unwrap().lists.is_empty());
    }

    #[test]
    fn existing_registered_membership_is_reactivated_not_duplicated() {
        let mut cached = remote("known@x.com", "7");
        cached.lists.push(ListMembership {
            id: REGISTERED.into(),
            status: Some("REMOVED".into()),
        });
        let plan = Reconciler::new(&RecordingGateway::new(), ListsConfig::default())
            .plan(&registrations(&["known@x.com"]), &cache_of([cached]));

        let lists = &plan[0].contact.lists;
        assert_eq!(lists.iter().filter(|l| l.id == REGISTERED).count(), 1);
        assert_eq!(
            lists.iter().find(|l| l.id == REGISTERED).unwrap().status.as_deref(),
            Some(ACTIVE)
        );
    }

    #[tokio::test]
    async fn second_pass_after_refresh_only_updates() {
        let gateway = RecordingGateway::with_remote([remote("known@x.com", "7")]);
        let cancel = CancellationToken::new();
        let reconciler = Reconciler::new(&gateway, ListsConfig::default());
        let set = registrations(&["a@x.com", "known@x.com", "b@x.com"]);

        let cache = drain_contacts(&gateway, &cancel).await.unwrap();
        let first = reconciler.reconcile(&set, &cache, &cancel).await.unwrap();
        assert_eq!(first.created, vec!["a@x.com", "b@x.com"]);

        let refreshed = drain_contacts(&gateway, &cancel).await.unwrap();
        let second = reconciler.reconcile(&set, &refreshed, &cancel).await.unwrap();

        assert!(second.created.is_empty());
        assert_eq!(second.updated, vec!["a@x.com", "known@x.com", "b@x.com"]);
        assert!(gateway.remote("a@x.com").unwrap().is_member_of(REGISTERED));
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_pass() {
        let gateway = RecordingGateway::new().rejecting("known@x.com", 400);
        let cache = cache_of([remote("known@x.com", "7")]);
        let set = registrations(&["a@x.com", "known@x.com", "c@x.com"]);

        let err = Reconciler::new(&gateway, ListsConfig::default())
            .reconcile(&set, &cache, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(gateway.calls().len(), 3);
        assert_eq!(err.report.created, vec!["a@x.com", "c@x.com"]);
        assert_eq!(err.failures().len(), 1);

        let last = err.last().unwrap();
        assert_eq!(last.email, "known@x.com");
        assert_eq!(last.action, SyncAction::Update);
        assert_eq!(last.error.status(), Some(400));

        let message = err.to_string();
        assert!(message.contains("1 of 3 records failed"), "{message}");
        assert!(message.contains("update known@x.com"), "{message}");
    }

    #[tokio::test]
    async fn message_names_the_last_of_several_failures() {
        let gateway = RecordingGateway::new()
            .rejecting("a@x.com", 400)
            .rejecting("b@x.com", 409);
        let set = registrations(&["a@x.com", "b@x.com", "c@x.com"]);

        let err = Reconciler::new(&gateway, ListsConfig::default())
            .reconcile(&set, &ContactCache::new(), &CancellationToken::new())
            .await
            .unwrap_err();

        let emails: Vec<_> = err.failures().iter().map(|f| f.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
        assert!(err.to_string().contains("create b@x.com"));
        assert!(err.to_string().contains("409"));
    }

    #[tokio::test]
    async fn cached_contact_without_remote_id_fails_its_update() {
        let mut orphan = remote("known@x.com", "7");
        orphan.id = None;
        let gateway = RecordingGateway::new();

        let err = Reconciler::new(&gateway, ListsConfig::default())
            .reconcile(&registrations(&["known@x.com"]), &cache_of([orphan]), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err.last().unwrap().error, ApiError::MissingId { .. }));
    }

    #[tokio::test]
    async fn cancelled_token_attempts_nothing() {
        let gateway = RecordingGateway::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = Reconciler::new(&gateway, ListsConfig::default())
            .reconcile(&registrations(&["a@x.com", "b@x.com"]), &ContactCache::new(), &cancel)
            .await
            .unwrap_err();

        assert!(gateway.calls().is_empty());
        assert_eq!(err.failures().len(), 2);
        assert!(err.failures().iter().all(|f| f.error.is_cancelled()));
    }

    #[tokio::test]
    async fn cancellation_mid_pass_reports_the_rest() {
        let cancel = CancellationToken::new();
        let gateway = RecordingGateway::new().cancelling_after(1, cancel.clone());

        let err = Reconciler::new(&gateway, ListsConfig::default())
            .reconcile(
                &registrations(&["a@x.com", "b@x.com", "c@x.com"]),
                &ContactCache::new(),
                &cancel,
            )
            .await
            .unwrap_err();

        assert_eq!(gateway.calls().len(), 1);
        assert_eq!(err.report.created, vec!["a@x.com"]);
        let cancelled: Vec<_> = err.failures().iter().map(|f| f.email.as_str()).collect();
        assert_eq!(cancelled, vec!["b@x.com", "c@x.com"]);
    }

    #[tokio::test]
    async fn duplicate_rows_are_submitted_once() {
        let rows = vec![
            vec!["Email".to_string(), "FirstName".into(), "LastName".into()],
            vec!["dup@x.com".into(), "First".into(), "Row".into()],
            vec!["other@x.com".into(), "Other".into(), "Row".into()],
            vec!["dup@x.com".into(), "Second".into(), "Row".into()],
        ];
        let set = RegistrationSet::from_rows(rows).unwrap();
        let gateway = RecordingGateway::new();

        let report = Reconciler::new(&gateway, ListsConfig::default())
            .reconcile(&set, &ContactCache::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.created, vec!["dup@x.com", "other@x.com"]);
        let Call::Create(first) = &gateway.calls()[0] else {
            panic!("expected create");
        };
        assert_eq!(first.first_name.as_deref(), Some("First"));
    }

    #[test]
    fn custom_reserved_lists_are_honoured() {
        let lists = ListsConfig {
            registered: "R".into(),
            unregistered: "42".into(),
        };
        let gateway = RecordingGateway::new();
        let plan = Reconciler::new(&gateway, lists)
            .plan(&registrations(&["known@x.com"]), &cache_of([remote("known@x.com", "7")]));

        assert_eq!(plan[0].action, SyncAction::Update);
        assert!(plan[0].contact.is_member_of("R"));
        assert!(!plan[0].contact.is_member_of("42"));
        assert!(plan[0].contact.is_member_of(UNREGISTERED));
    }
}
