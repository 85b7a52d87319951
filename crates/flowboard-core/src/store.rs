//! Canonical in-memory issue collection.
//!
//! [`IssueStore`] is the single owner of every [`Issue`]. Readers get clones
//! ([`IssueStore::get`], [`IssueStore::snapshot`]) or shared borrows
//! ([`IssueStore::iter`]); no `&mut Issue` ever leaves the store, so all state
//! changes go through the operations below.
//!
//! Ids come from a high-water mark: the next id is one past the largest id the
//! store has ever held, so deleting the newest issue does not free its id.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::model::{Comment, CommentId, FieldValue, Issue, IssueDraft, IssueId, IssuePatch};

/// Reporter recorded when a draft does not name one.
pub const DEFAULT_REPORTER: &str = "Current User";

/// Owned, injectable issue container.
pub struct IssueStore {
    issues: Vec<Issue>,
    high_water: IssueId,
    clock: Box<dyn Clock>,
    default_reporter: String,
}

impl Default for IssueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IssueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueStore")
            .field("issues", &self.issues.len())
            .field("high_water", &self.high_water)
            .field("default_reporter", &self.default_reporter)
            .finish_non_exhaustive()
    }
}

impl IssueStore {
    /// Empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }

    /// Empty store on an injected clock.
    #[must_use]
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            issues: Vec::new(),
            high_water: IssueId(0),
            clock: Box::new(clock),
            default_reporter: DEFAULT_REPORTER.to_string(),
        }
    }

    #[must_use]
    pub fn with_default_reporter(mut self, reporter: impl Into<String>) -> Self {
        self.default_reporter = reporter.into();
        self
    }

    /// Read the store clock. Each call returns a later instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: IssueId) -> bool {
        self.position(id).is_some()
    }

    /// Index of `id` in insertion order.
    #[must_use]
    pub fn position(&self, id: IssueId) -> Option<usize> {
        self.issues.iter().position(|issue| issue.id == id)
    }

    /// Shared view of every issue in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    /// Shared view of one issue.
    #[must_use]
    pub fn view(&self, id: IssueId) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    /// Copy of every issue in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Issue> {
        self.issues.clone()
    }

    /// Copy of one issue.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn get(&self, id: IssueId) -> Result<Issue, CoreError> {
        self.view(id).cloned().ok_or(CoreError::NotFound { id })
    }

    /// Create an issue from `draft`, assigning its id and timestamps.
    ///
    /// Creation never validates; an empty draft yields an untitled issue with
    /// every default applied. Title checks belong to edit-commit.
    pub fn create(&mut self, draft: IssueDraft) -> Issue {
        let id = self.allocate_id();
        let issue = draft.into_issue(id, self.clock.now(), &self.default_reporter);
        debug!(issue_id = %id, "created issue");
        self.issues.push(issue.clone());
        issue
    }

    /// Shallow-merge `patch` into an issue and refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn update(&mut self, id: IssueId, patch: IssuePatch) -> Result<Issue, CoreError> {
        let now = self.clock.now();
        let issue = self.slot(id)?;
        for value in patch.into_values() {
            value.write(issue);
        }
        issue.updated_at = now;
        debug!(issue_id = %id, "updated issue");
        Ok(issue.clone())
    }

    /// Remove an issue permanently. Its id is never handed out again.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn delete(&mut self, id: IssueId) -> Result<Issue, CoreError> {
        let index = self.position(id).ok_or(CoreError::NotFound { id })?;
        debug!(issue_id = %id, "deleted issue");
        Ok(self.issues.remove(index))
    }

    /// Append a comment authored now. Existing comments are never modified.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn append_comment(
        &mut self,
        id: IssueId,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Comment, CoreError> {
        let now = self.clock.now();
        let issue = self.slot(id)?;
        let comment = Comment {
            id: CommentId::next_after(&issue.comments),
            author: author.into(),
            content: content.into(),
            created_at: now,
        };
        issue.comments.push(comment.clone());
        issue.updated_at = now;
        debug!(issue_id = %id, comment_id = %comment.id, "appended comment");
        Ok(comment)
    }

    /// Replace the whole collection, e.g. after a full fetch from the backend.
    /// The high-water mark only ever grows.
    pub fn replace_all(&mut self, issues: Vec<Issue>) {
        self.issues = issues;
        self.raise_high_water();
        debug!(count = self.issues.len(), "replaced store contents");
    }

    /// Insert an issue created elsewhere (typically by the backend), or
    /// overwrite the local copy with the same id.
    pub fn adopt(&mut self, issue: Issue) -> Issue {
        match self.position(issue.id) {
            Some(index) => self.issues[index] = issue.clone(),
            None => self.issues.push(issue.clone()),
        }
        self.raise_high_water();
        issue
    }

    /// Put a previously deleted issue back at `position` (clamped).
    pub fn restore(&mut self, position: usize, issue: Issue) {
        if self.contains(issue.id) {
            return;
        }
        let index = position.min(self.issues.len());
        debug!(issue_id = %issue.id, index, "restored issue");
        self.issues.insert(index, issue);
        self.raise_high_water();
    }

    /// Apply field values and refresh `updated_at`, returning the prior value
    /// of each field, the prior `updated_at`, and the resulting issue.
    pub(crate) fn apply_fields(
        &mut self,
        id: IssueId,
        values: Vec<FieldValue>,
    ) -> Result<AppliedFields, CoreError> {
        let now = self.clock.now();
        let issue = self.slot(id)?;
        let prior_updated_at = issue.updated_at;
        let mut changes = Vec::with_capacity(values.len());
        for value in values {
            let field = value.field();
            let prior = FieldValue::read(issue, field);
            value.write(issue);
            changes.push((prior, FieldValue::read(issue, field)));
        }
        issue.updated_at = now;
        Ok(AppliedFields {
            changes,
            prior_updated_at,
            issue: issue.clone(),
        })
    }

    /// Mutate an issue without touching `updated_at`. Used to reconcile and
    /// roll back, which restore state rather than create new edits.
    pub(crate) fn edit_in_place<R>(
        &mut self,
        id: IssueId,
        edit: impl FnOnce(&mut Issue) -> R,
    ) -> Result<R, CoreError> {
        Ok(edit(self.slot(id)?))
    }

    fn slot(&mut self, id: IssueId) -> Result<&mut Issue, CoreError> {
        self.issues
            .iter_mut()
            .find(|issue| issue.id == id)
            .ok_or(CoreError::NotFound { id })
    }

    fn allocate_id(&mut self) -> IssueId {
        self.raise_high_water();
        self.high_water = self.high_water.next();
        self.high_water
    }

    fn raise_high_water(&mut self) {
        if let Some(max) = self.issues.iter().map(|issue| issue.id).max() {
            self.high_water = self.high_water.max(max);
        }
    }
}

/// Result of [`IssueStore::apply_fields`]: `(prior, next)` per field.
#[derive(Debug, Clone)]
pub(crate) struct AppliedFields {
    pub changes: Vec<(FieldValue, FieldValue)>,
    pub prior_updated_at: DateTime<Utc>,
    pub issue: Issue,
}
