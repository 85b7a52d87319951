//! The issue workspace: local store, backend, and the optimistic protocol
//! between them.
//!
//! Reads are served from the local [`IssueStore`]. Writes go through one of
//! three paths:
//!
//! - **Optimistic** (`edit_issue`, `transition`, `update_priority`,
//!   `add_comment`): stage locally, call the backend, settle. The same steps
//!   are available separately through [`Workspace::stage_update`] and
//!   [`Workspace::settle`] for callers that must not block on the backend.
//! - **Confirm first** (`create_issue`): the backend assigns the id, then the
//!   store adopts the result.
//! - **Remove then restore** (`delete_issue`): the issue disappears at once
//!   and returns to its old position if the backend refuses.

use tracing::{debug, info, warn};

use crate::error::{CoreError, GatewayError};
use crate::gateway::PersistenceGateway;
use crate::model::{Comment, CommentId, Issue, IssueDraft, IssueId, IssuePatch, Priority, Status};
use crate::notify::{Action, Notice, Notifier};
use crate::query::{DashboardStats, FilterSet, ViewQuery};
use crate::store::{DEFAULT_REPORTER, IssueStore};
use crate::sync::{FieldChange, Ledger, SettleOutcome, StagedUpdate, Ticket, reconcile};
use crate::workflow::{BoardColumn, DragSession, TransitionOutcome, board_columns};

/// Owns the local store and the backend for one board.
pub struct Workspace<G: PersistenceGateway> {
    store: IssueStore,
    gateway: G,
    ledger: Ledger,
    notifier: Option<Box<dyn Notifier>>,
    author: String,
}

impl<G: PersistenceGateway> std::fmt::Debug for Workspace<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("store", &self.store)
            .field("pending", &self.ledger.len())
            .field("author", &self.author)
            .finish_non_exhaustive()
    }
}

impl<G: PersistenceGateway> Workspace<G> {
    /// Workspace over `store` and `gateway`, without a notifier.
    #[must_use]
    pub fn new(store: IssueStore, gateway: G) -> Self {
        Self {
            store,
            gateway,
            ledger: Ledger::new(),
            notifier: None,
            author: DEFAULT_REPORTER.to_string(),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    /// Name recorded as the author of new comments.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    #[must_use]
    pub const fn store(&self) -> &IssueStore {
        &self.store
    }

    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    pub const fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Replace the local store with everything the backend holds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Persistence`] if the fetch fails; the store is
    /// left as it was.
    pub fn load(&mut self) -> Result<usize, CoreError> {
        let issues = self.gateway.fetch_all()?;
        let count = issues.len();
        self.store.replace_all(issues);
        info!(count, "loaded issues from backend");
        Ok(count)
    }

    /// Local copy of one issue.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn get(&self, id: IssueId) -> Result<Issue, CoreError> {
        self.store.get(id)
    }

    // -----------------------------------------------------------------------
    // Creation and deletion
    // -----------------------------------------------------------------------

    /// Validate `draft`, create it in the backend, and adopt the result.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a blank title (nothing is sent),
    /// or [`CoreError::Persistence`] when the backend fails (nothing is added
    /// locally).
    pub fn create_issue(&mut self, draft: IssueDraft) -> Result<Issue, CoreError> {
        draft.validate()?;
        match self.gateway.create(&draft) {
            Ok(created) => {
                let issue = self.store.adopt(created);
                info!(issue_id = %issue.id, "created issue");
                self.emit(&Notice::Created { issue_id: issue.id });
                Ok(issue)
            }
            Err(err) => Err(self.fail(Action::Create, None, err)),
        }
    }

    /// Remove an issue locally, then in the backend. If the backend fails or
    /// reports that nothing was deleted, the issue is put back where it was.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id, or
    /// [`CoreError::Persistence`] after restoring the issue.
    pub fn delete_issue(&mut self, id: IssueId) -> Result<(), CoreError> {
        let position = self.store.position(id).ok_or(CoreError::NotFound { id })?;
        let removed = self.store.delete(id)?;
        let failure = match self.gateway.delete(id) {
            Ok(true) => None,
            Ok(false) => Some(GatewayError::NotFound(id)),
            Err(err) => Some(err),
        };
        match failure {
            None => {
                info!(issue_id = %id, "deleted issue");
                self.emit(&Notice::Deleted { issue_id: id });
                Ok(())
            }
            Some(err) => {
                self.store.restore(position, removed);
                Err(self.fail(Action::Delete, Some(id), err))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Optimistic updates
    // -----------------------------------------------------------------------

    /// Apply `patch` locally and record it for settlement. The backend is
    /// not contacted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a blank title or
    /// [`CoreError::NotFound`] for an unknown id; nothing is staged then.
    pub fn stage_update(&mut self, id: IssueId, patch: IssuePatch) -> Result<StagedUpdate, CoreError> {
        patch.validate()?;
        let applied = self.store.apply_fields(id, patch.into_values())?;
        let changes = applied
            .changes
            .into_iter()
            .map(|(prior, next)| FieldChange { prior, next })
            .collect();
        let ticket = self.ledger.record(
            id,
            changes,
            applied.prior_updated_at,
            applied.issue.updated_at,
        );
        let patch = self
            .ledger
            .get(ticket)
            .map(crate::sync::PendingMutation::outgoing_patch)
            .unwrap_or_default();
        debug!(issue_id = %id, %ticket, "staged update");
        Ok(StagedUpdate {
            ticket,
            issue: applied.issue,
            patch,
        })
    }

    /// Settle a staged update with the backend's answer.
    ///
    /// Success merges the server's values into fields this update still
    /// owns. Failure restores the prior value of each such field. Fields a
    /// later local edit has changed are left alone either way.
    pub fn settle(&mut self, ticket: Ticket, answer: Result<Issue, GatewayError>) -> SettleOutcome {
        let Some(mutation) = self.ledger.take(ticket) else {
            debug!(%ticket, "settle on unknown or settled ticket");
            return SettleOutcome::Stale;
        };
        let issue_id = mutation.issue_id;
        let merged = match &answer {
            Ok(server) => self
                .store
                .edit_in_place(issue_id, |issue| reconcile::confirm(issue, &mutation, server)),
            Err(_) => self
                .store
                .edit_in_place(issue_id, |issue| reconcile::rollback(issue, &mutation)),
        };
        let Ok(report) = merged else {
            debug!(issue_id = %issue_id, %ticket, "issue gone before settle");
            return SettleOutcome::Discarded { issue_id };
        };
        match answer {
            Ok(_) => {
                debug!(issue_id = %issue_id, %ticket, touched = report.touched.len(), "confirmed update");
                SettleOutcome::Confirmed { issue_id, report }
            }
            Err(err) => {
                if !report.timestamp_touched {
                    self.ledger.hand_down_prior(&mutation);
                }
                warn!(
                    issue_id = %issue_id,
                    %ticket,
                    restored = report.touched.len(),
                    superseded = report.superseded.len(),
                    error = %err,
                    "rolled back update"
                );
                SettleOutcome::RolledBack { issue_id, report }
            }
        }
    }

    /// Edit-commit: validate, apply optimistically, persist, settle.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`], [`CoreError::NotFound`], or
    /// [`CoreError::Persistence`] after rolling back.
    pub fn edit_issue(&mut self, id: IssueId, patch: IssuePatch) -> Result<Issue, CoreError> {
        let staged = self.stage_update(id, patch)?;
        self.commit(&staged, Action::Update)?;
        self.emit(&Notice::Updated { issue_id: id });
        self.store.get(id)
    }

    /// Move an issue to `target`. Moving to the current status writes
    /// nothing and does not contact the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id, or
    /// [`CoreError::Persistence`] after restoring the status.
    pub fn transition(&mut self, id: IssueId, target: Status) -> Result<TransitionOutcome, CoreError> {
        let from = self.store.view(id).ok_or(CoreError::NotFound { id })?.status;
        let outcome = TransitionOutcome::between(from, target);
        if !outcome.is_moved() {
            debug!(issue_id = %id, status = %target, "transition to current status skipped");
            return Ok(outcome);
        }
        let staged = self.stage_update(id, IssuePatch::status(target))?;
        self.commit(&staged, Action::Transition)?;
        info!(issue_id = %id, from = %from, to = %target, "moved issue");
        self.emit(&Notice::StatusChanged {
            issue_id: id,
            from,
            to: target,
        });
        Ok(outcome)
    }

    /// Finish a drag. A drop outside the board or onto the originating
    /// column does nothing and returns `None`.
    ///
    /// # Errors
    ///
    /// Same as [`Workspace::transition`].
    pub fn drop_issue(
        &mut self,
        drag: DragSession,
        column: Option<Status>,
    ) -> Result<Option<TransitionOutcome>, CoreError> {
        match drag.drop_on(column) {
            Some(request) => self.transition(request.issue_id, request.to).map(Some),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id, or
    /// [`CoreError::Persistence`] after restoring the priority.
    pub fn update_priority(&mut self, id: IssueId, priority: Priority) -> Result<Issue, CoreError> {
        let staged = self.stage_update(id, IssuePatch::priority(priority))?;
        self.commit(&staged, Action::Prioritize)?;
        self.emit(&Notice::PriorityChanged {
            issue_id: id,
            to: priority,
        });
        self.store.get(id)
    }

    /// Append a comment by the workspace author. Blank text is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for blank text,
    /// [`CoreError::NotFound`] for an unknown id, or
    /// [`CoreError::Persistence`] after removing the comment again.
    pub fn add_comment(&mut self, id: IssueId, content: &str) -> Result<Comment, CoreError> {
        if content.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "comment",
                reason: "must not be empty",
            });
        }
        let existing = self.store.view(id).ok_or(CoreError::NotFound { id })?;
        let comment = Comment {
            id: CommentId::next_after(&existing.comments),
            author: self.author.clone(),
            content: content.trim().to_string(),
            created_at: self.store.now(),
        };
        let mut comments = existing.comments.clone();
        comments.push(comment.clone());

        let staged = self.stage_update(
            id,
            IssuePatch {
                comments: Some(comments),
                ..IssuePatch::default()
            },
        )?;
        self.commit(&staged, Action::Comment)?;
        self.emit(&Notice::CommentAdded {
            issue_id: id,
            comment_id: comment.id.clone(),
        });
        Ok(comment)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Filtered, searched, and sorted copy of the local issues.
    #[must_use]
    pub fn view(&self, query: &ViewQuery) -> Vec<Issue> {
        query.apply(&self.store.snapshot())
    }

    /// Kanban columns over the issues passing `query`'s filter and search.
    #[must_use]
    pub fn board(&self, query: &ViewQuery) -> Vec<BoardColumn> {
        board_columns(&query.apply(&self.store.snapshot()))
    }

    /// Dashboard figures as of the store clock.
    #[must_use]
    pub fn stats(&self, recent_days: u32) -> DashboardStats {
        DashboardStats::compute(&self.store.snapshot(), self.store.now(), recent_days)
    }

    /// Search performed by the backend rather than the local copy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Persistence`] when the backend fails.
    pub fn search_backend(&self, query: &str) -> Result<Vec<Issue>, CoreError> {
        Ok(self.gateway.search(query)?)
    }

    /// Filter performed by the backend rather than the local copy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Persistence`] when the backend fails.
    pub fn filter_backend(&self, criteria: &FilterSet) -> Result<Vec<Issue>, CoreError> {
        Ok(self.gateway.filter(criteria)?)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn commit(&mut self, staged: &StagedUpdate, action: Action) -> Result<(), CoreError> {
        let issue_id = staged.issue.id;
        let answer = self.gateway.update(issue_id, &staged.patch);
        let failure = answer.as_ref().err().cloned();
        self.settle(staged.ticket, answer);
        match failure {
            None => Ok(()),
            Some(err) => Err(self.fail(action, Some(issue_id), err)),
        }
    }

    fn fail(&self, action: Action, issue_id: Option<IssueId>, err: GatewayError) -> CoreError {
        warn!(action = %action, issue_id = ?issue_id.map(IssueId::get), error = %err, "backend call failed");
        self.emit(&Notice::Failed {
            action,
            issue_id,
            reason: err.to_string(),
        });
        CoreError::Persistence(err)
    }

    fn emit(&self, notice: &Notice) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Workspace;
    use crate::clock::ManualClock;
    use crate::error::{CoreError, GatewayError};
    use crate::gateway::{InMemoryGateway, PersistenceGateway};
    use crate::model::{IssueDraft, IssueId, IssuePatch, Priority, Status};
    use crate::notify::{Notice, RecordingNotifier};
    use crate::store::IssueStore;
    use crate::sync::SettleOutcome;
    use crate::workflow::{DragSession, TransitionOutcome};
    use chrono::{TimeZone, Utc};
    use std::rc::Rc;

    fn workspace() -> (Workspace<InMemoryGateway>, RecordingNotifier) {
        let clock = Rc::new(ManualClock::starting_at(
            Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap(),
        ));
        let recorder = RecordingNotifier::new();
        let ws = Workspace::new(
            IssueStore::with_clock(Rc::clone(&clock)),
            InMemoryGateway::with_store(IssueStore::with_clock(clock)),
        )
        .with_notifier(recorder.clone());
        (ws, recorder)
    }

    #[test]
    fn create_is_confirmed_by_backend_first() {
        let (mut ws, recorder) = workspace();
        let issue = ws.create_issue(IssueDraft::titled("Login bug")).unwrap();
        assert_eq!(issue.id, IssueId(1));
        assert_eq!(ws.store().len(), 1);
        assert_eq!(ws.gateway().store().len(), 1);
        assert_eq!(recorder.notices(), vec![Notice::Created { issue_id: IssueId(1) }]);
    }

    #[test]
    fn create_validates_before_contacting_backend() {
        let (mut ws, _) = workspace();
        assert!(matches!(
            ws.create_issue(IssueDraft::titled("  ")),
            Err(CoreError::Validation { field: "title", .. })
        ));
        assert!(ws.gateway().store().is_empty());
    }

    #[test]
    fn failed_create_leaves_store_untouched() {
        let (mut ws, recorder) = workspace();
        ws.gateway().fail_next(1);
        assert!(matches!(
            ws.create_issue(IssueDraft::titled("x")),
            Err(CoreError::Persistence(_))
        ));
        assert!(ws.store().is_empty());
        assert_eq!(recorder.failures(), 1);
    }

    #[test]
    fn transition_to_same_status_skips_backend() {
        let (mut ws, recorder) = workspace();
        let id = ws.create_issue(IssueDraft::titled("x")).unwrap().id;
        let before = ws.get(id).unwrap();
        ws.gateway().set_offline(true);
        let outcome = ws.transition(id, Status::Backlog).unwrap();
        assert_eq!(outcome, TransitionOutcome::Unchanged { status: Status::Backlog });
        assert_eq!(ws.get(id).unwrap(), before);
        assert_eq!(recorder.failures(), 0);
    }

    #[test]
    fn transition_moves_and_refreshes_timestamp() {
        let (mut ws, _) = workspace();
        let created = ws.create_issue(IssueDraft::titled("x")).unwrap();
        let outcome = ws.transition(created.id, Status::Done).unwrap();
        assert!(outcome.is_moved());
        let after = ws.get(created.id).unwrap();
        assert_eq!(after.status, Status::Done);
        assert!(after.updated_at > created.updated_at);
        assert!(ws.ledger().is_empty());
    }

    #[test]
    fn failed_priority_change_rolls_back() {
        let (mut ws, recorder) = workspace();
        let created = ws.create_issue(IssueDraft::titled("x")).unwrap();
        ws.gateway().fail_next(1);
        assert!(ws.update_priority(created.id, Priority::Critical).is_err());
        let after = ws.get(created.id).unwrap();
        assert_eq!(after.priority, Priority::Medium);
        assert_eq!(after.updated_at, created.updated_at);
        assert_eq!(recorder.failures(), 1);
    }

    #[test]
    fn delete_restores_position_when_backend_refuses() {
        let (mut ws, _) = workspace();
        let a = ws.create_issue(IssueDraft::titled("a")).unwrap().id;
        let b = ws.create_issue(IssueDraft::titled("b")).unwrap().id;
        let c = ws.create_issue(IssueDraft::titled("c")).unwrap().id;
        ws.gateway().fail_next(1);
        assert!(ws.delete_issue(b).is_err());
        let order: Vec<IssueId> = ws.store().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![a, b, c]);

        ws.gateway_mut().delete(b).unwrap();
        assert!(matches!(
            ws.delete_issue(b),
            Err(CoreError::Persistence(GatewayError::NotFound(_)))
        ));
        assert!(ws.store().contains(b));

        ws.delete_issue(a).unwrap();
        assert!(!ws.store().contains(a));
    }

    #[test]
    fn comments_are_appended_and_rolled_back_on_failure() {
        let (mut ws, _) = workspace();
        let id = ws.create_issue(IssueDraft::titled("x")).unwrap().id;
        let comment = ws.add_comment(id, "Looks good").unwrap();
        assert_eq!(comment.id.as_str(), "c1");
        assert_eq!(comment.author, "Current User");

        ws.gateway().fail_next(1);
        assert!(ws.add_comment(id, "second").is_err());
        assert_eq!(ws.get(id).unwrap().comments.len(), 1);
        assert!(matches!(
            ws.add_comment(id, "   "),
            Err(CoreError::Validation { field: "comment", .. })
        ));
    }

    #[test]
    fn drop_onto_other_column_transitions() {
        let (mut ws, _) = workspace();
        let issue = ws.create_issue(IssueDraft::titled("x")).unwrap();
        let drag = DragSession::start(&issue);
        assert_eq!(ws.drop_issue(drag, Some(Status::Backlog)).unwrap(), None);
        assert_eq!(ws.drop_issue(drag, None).unwrap(), None);
        let moved = ws.drop_issue(drag, Some(Status::Review)).unwrap();
        assert_eq!(
            moved,
            Some(TransitionOutcome::Moved {
                from: Status::Backlog,
                to: Status::Review,
            })
        );
    }

    #[test]
    fn settle_twice_is_stale() {
        let (mut ws, _) = workspace();
        let id = ws.create_issue(IssueDraft::titled("x")).unwrap().id;
        let staged = ws.stage_update(id, IssuePatch::title("y")).unwrap();
        let first = ws.settle(staged.ticket, Err(GatewayError::Unavailable("down".into())));
        assert!(matches!(first, SettleOutcome::RolledBack { .. }));
        assert_eq!(ws.get(id).unwrap().title, "x");
        let second = ws.settle(staged.ticket, Err(GatewayError::Unavailable("down".into())));
        assert!(second.is_stale());
    }

    #[test]
    fn settle_after_local_delete_is_discarded() {
        let (mut ws, _) = workspace();
        let id = ws.create_issue(IssueDraft::titled("x")).unwrap().id;
        let staged = ws.stage_update(id, IssuePatch::status(Status::Todo)).unwrap();
        ws.delete_issue(id).unwrap();
        let outcome = ws.settle(staged.ticket, Err(GatewayError::Rejected("gone".into())));
        assert_eq!(outcome, SettleOutcome::Discarded { issue_id: id });
    }

    #[test]
    fn load_replaces_local_copy() {
        let (mut ws, _) = workspace();
        ws.gateway_mut().create(&IssueDraft::titled("remote")).unwrap();
        assert_eq!(ws.load().unwrap(), 1);
        assert_eq!(ws.get(IssueId(1)).unwrap().title, "remote");
        let local = ws.create_issue(IssueDraft::titled("next")).unwrap();
        assert_eq!(local.id, IssueId(2));
    }
}
