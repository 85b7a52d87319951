//! Persistence boundary.
//!
//! [`PersistenceGateway`] is the only way the workspace talks to durable
//! storage. Every call can fail with a [`GatewayError`]; callers roll back
//! their optimistic writes when it does.
//!
//! [`InMemoryGateway`] keeps its own [`IssueStore`], so ids and timestamps are
//! assigned on the "server" side exactly as a real backend would. It can be
//! told to fail, which is how the rollback paths are tested.

use std::cell::Cell;
use tracing::debug;

use crate::error::{CoreError, GatewayError};
use crate::model::{Issue, IssueDraft, IssueId, IssuePatch};
use crate::query::{FilterSet, apply_filters, search_issues};
use crate::store::IssueStore;

pub trait PersistenceGateway {
    /// Every stored issue in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the backend fails.
    fn fetch_all(&self) -> Result<Vec<Issue>, GatewayError>;

    /// One issue, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the backend fails.
    fn fetch_by_id(&self, id: IssueId) -> Result<Option<Issue>, GatewayError>;

    /// Create an issue; the backend assigns id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the backend fails.
    fn create(&mut self, draft: &IssueDraft) -> Result<Issue, GatewayError>;

    /// Apply a partial update and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for an unknown id, or another
    /// [`GatewayError`] when the backend fails.
    fn update(&mut self, id: IssueId, patch: &IssuePatch) -> Result<Issue, GatewayError>;

    /// Remove an issue. `Ok(false)` when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the backend fails.
    fn delete(&mut self, id: IssueId) -> Result<bool, GatewayError>;

    /// Case-insensitive literal search over the searchable fields.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the backend fails.
    fn search(&self, query: &str) -> Result<Vec<Issue>, GatewayError>;

    /// Issues passing every non-empty category of `criteria`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the backend fails.
    fn filter(&self, criteria: &FilterSet) -> Result<Vec<Issue>, GatewayError>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Volatile backend with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    store: IssueStore,
    offline: Cell<bool>,
    failures_left: Cell<u32>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend over an existing store, e.g. one sharing a test clock.
    #[must_use]
    pub fn with_store(store: IssueStore) -> Self {
        Self {
            store,
            offline: Cell::new(false),
            failures_left: Cell::new(0),
        }
    }

    /// Backend pre-populated with `issues` as-is.
    #[must_use]
    pub fn seeded(issues: Vec<Issue>) -> Self {
        let mut store = IssueStore::new();
        store.replace_all(issues);
        Self::with_store(store)
    }

    /// Make the next `count` calls fail with [`GatewayError::Rejected`].
    pub fn fail_next(&self, count: u32) {
        self.failures_left.set(count);
    }

    /// While offline every call fails with [`GatewayError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// The backend's own copy of the data.
    #[must_use]
    pub const fn store(&self) -> &IssueStore {
        &self.store
    }

    fn check(&self, op: &'static str) -> Result<(), GatewayError> {
        if self.offline.get() {
            debug!(op, "in-memory backend offline");
            return Err(GatewayError::Unavailable("backend offline".into()));
        }
        let left = self.failures_left.get();
        if left > 0 {
            self.failures_left.set(left - 1);
            debug!(op, remaining = left - 1, "injected backend failure");
            return Err(GatewayError::Rejected(format!("injected failure in {op}")));
        }
        Ok(())
    }
}

fn not_found(err: CoreError) -> GatewayError {
    match err {
        CoreError::NotFound { id } => GatewayError::NotFound(id),
        other => GatewayError::Rejected(other.to_string()),
    }
}

impl PersistenceGateway for InMemoryGateway {
    fn fetch_all(&self) -> Result<Vec<Issue>, GatewayError> {
        self.check("fetch_all")?;
        Ok(self.store.snapshot())
    }

    fn fetch_by_id(&self, id: IssueId) -> Result<Option<Issue>, GatewayError> {
        self.check("fetch_by_id")?;
        Ok(self.store.view(id).cloned())
    }

    fn create(&mut self, draft: &IssueDraft) -> Result<Issue, GatewayError> {
        self.check("create")?;
        Ok(self.store.create(draft.clone()))
    }

    fn update(&mut self, id: IssueId, patch: &IssuePatch) -> Result<Issue, GatewayError> {
        self.check("update")?;
        self.store.update(id, patch.clone()).map_err(not_found)
    }

    fn delete(&mut self, id: IssueId) -> Result<bool, GatewayError> {
        self.check("delete")?;
        Ok(self.store.delete(id).is_ok())
    }

    fn search(&self, query: &str) -> Result<Vec<Issue>, GatewayError> {
        self.check("search")?;
        Ok(search_issues(&self.store.snapshot(), query))
    }

    fn filter(&self, criteria: &FilterSet) -> Result<Vec<Issue>, GatewayError> {
        self.check("filter")?;
        Ok(apply_filters(&self.store.snapshot(), criteria))
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryGateway, PersistenceGateway};
    use crate::error::GatewayError;
    use crate::model::{IssueDraft, IssueId, IssuePatch, Status};
    use crate::query::FilterSet;

    #[test]
    fn backend_assigns_ids_and_applies_updates() {
        let mut gateway = InMemoryGateway::new();
        let created = gateway.create(&IssueDraft::titled("Login bug")).unwrap();
        assert_eq!(created.id, IssueId(1));
        let updated = gateway
            .update(created.id, &IssuePatch::status(Status::Review))
            .unwrap();
        assert_eq!(updated.status, Status::Review);
        assert_eq!(gateway.fetch_all().unwrap().len(), 1);
    }

    #[test]
    fn unknown_ids_surface_as_not_found() {
        let mut gateway = InMemoryGateway::new();
        assert_eq!(
            gateway.update(IssueId(3), &IssuePatch::default()),
            Err(GatewayError::NotFound(IssueId(3)))
        );
        assert!(!gateway.delete(IssueId(3)).unwrap());
        assert!(gateway.fetch_by_id(IssueId(3)).unwrap().is_none());
    }

    #[test]
    fn injected_failures_are_consumed_in_order() {
        let mut gateway = InMemoryGateway::new();
        gateway.fail_next(2);
        assert!(matches!(
            gateway.create(&IssueDraft::titled("a")),
            Err(GatewayError::Rejected(_))
        ));
        assert!(gateway.fetch_all().is_err());
        assert!(gateway.fetch_all().is_ok());
    }

    #[test]
    fn offline_fails_every_call_until_restored() {
        let mut gateway = InMemoryGateway::new();
        gateway.set_offline(true);
        assert!(matches!(
            gateway.search("x"),
            Err(GatewayError::Unavailable(_))
        ));
        assert!(gateway.filter(&FilterSet::new()).is_err());
        gateway.set_offline(false);
        assert!(gateway.create(&IssueDraft::titled("back")).is_ok());
    }

    #[test]
    fn search_and_filter_use_core_semantics() {
        let mut gateway = InMemoryGateway::new();
        gateway.create(&IssueDraft::titled("Login Bug Report")).unwrap();
        gateway.create(&IssueDraft::titled("Feature Request")).unwrap();
        assert_eq!(gateway.search("bug").unwrap().len(), 1);
        let backlog = FilterSet::new().with_status([Status::Backlog]);
        assert_eq!(gateway.filter(&backlog).unwrap().len(), 2);
    }
}
