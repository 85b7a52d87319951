//! Issue status workflow and kanban board grouping.
//!
//! # Transition graph
//!
//! The five statuses form a complete graph: any status may move to any other,
//! including backwards (`done -> backlog` reopens an issue). There is no
//! terminal state. Moving an issue to the status it already has is not an
//! error; it is reported as [`TransitionOutcome::Unchanged`] and performs no
//! write.
//!
//! # Drag and drop
//!
//! A [`DragSession`] captures the dragged issue and the column it left. Each
//! drop yields at most one [`TransitionRequest`]; sessions share no state, so
//! independent drags commute.

use serde::Serialize;

use crate::model::{Issue, IssueId, Status};

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

impl Status {
    /// Whether moving from `self` to `target` is permitted.
    ///
    /// Always `true`: every status may move to every other.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn can_transition_to(self, _target: Self) -> bool {
        true
    }
}

/// What a transition did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The issue already had the target status; nothing was written.
    Unchanged { status: Status },
    /// The status changed and `updated_at` was refreshed.
    Moved { from: Status, to: Status },
}

impl TransitionOutcome {
    #[must_use]
    pub const fn between(from: Status, to: Status) -> Self {
        if from.rank() == to.rank() {
            Self::Unchanged { status: to }
        } else {
            Self::Moved { from, to }
        }
    }

    #[must_use]
    pub const fn is_moved(self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    /// The status the issue ends up in.
    #[must_use]
    pub const fn status(self) -> Status {
        match self {
            Self::Unchanged { status } | Self::Moved { to: status, .. } => status,
        }
    }
}

/// A request to move one issue, produced by a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRequest {
    pub issue_id: IssueId,
    pub from: Status,
    pub to: Status,
}

// ---------------------------------------------------------------------------
// Drag and drop
// ---------------------------------------------------------------------------

/// An in-flight drag of a single issue card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    issue_id: IssueId,
    origin: Status,
}

impl DragSession {
    /// Start dragging `issue` out of its current column.
    #[must_use]
    pub const fn start(issue: &Issue) -> Self {
        Self {
            issue_id: issue.id,
            origin: issue.status,
        }
    }

    #[must_use]
    pub const fn issue_id(&self) -> IssueId {
        self.issue_id
    }

    #[must_use]
    pub const fn origin(&self) -> Status {
        self.origin
    }

    /// Whether hovering `column` would highlight it as a drop target.
    #[must_use]
    pub fn is_drop_target(&self, column: Status) -> bool {
        column != self.origin
    }

    /// Finish the drag. `None` for a drop outside any column or back onto
    /// the originating column; otherwise one transition request.
    #[must_use]
    pub fn drop_on(self, column: Option<Status>) -> Option<TransitionRequest> {
        let to = column?;
        if to == self.origin || !self.origin.can_transition_to(to) {
            return None;
        }
        Some(TransitionRequest {
            issue_id: self.issue_id,
            from: self.origin,
            to,
        })
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// One kanban column and the issues in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardColumn {
    pub status: Status,
    pub title: &'static str,
    pub issues: Vec<Issue>,
}

impl BoardColumn {
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Group `issues` into the five columns in workflow order. Within a column
/// the input order is kept.
#[must_use]
pub fn board_columns(issues: &[Issue]) -> Vec<BoardColumn> {
    Status::ALL
        .iter()
        .map(|&status| BoardColumn {
            status,
            title: status.title(),
            issues: issues
                .iter()
                .filter(|issue| issue.status == status)
                .cloned()
                .collect(),
        })
        .collect()
}
