//! User-facing outcome notices.
//!
//! The workspace emits one [`Notice`] per completed or failed operation. How
//! it reaches a person (toast, log line, nothing) is up to the [`Notifier`].

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{info, warn};

use crate::model::{CommentId, IssueId, Priority, Status};

/// Operation a failure notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Transition,
    Prioritize,
    Comment,
    Delete,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create issue",
            Self::Update => "update issue",
            Self::Transition => "update issue status",
            Self::Prioritize => "update priority",
            Self::Comment => "add comment",
            Self::Delete => "delete issue",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    Created { issue_id: IssueId },
    Updated { issue_id: IssueId },
    StatusChanged { issue_id: IssueId, from: Status, to: Status },
    PriorityChanged { issue_id: IssueId, to: Priority },
    CommentAdded { issue_id: IssueId, comment_id: CommentId },
    Deleted { issue_id: IssueId },
    Failed {
        action: Action,
        issue_id: Option<IssueId>,
        reason: String,
    },
}

impl Notice {
    #[must_use]
    pub const fn level(&self) -> Level {
        match self {
            Self::Failed { .. } => Level::Error,
            _ => Level::Success,
        }
    }

    #[must_use]
    pub const fn issue_id(&self) -> Option<IssueId> {
        match self {
            Self::Created { issue_id }
            | Self::Updated { issue_id }
            | Self::StatusChanged { issue_id, .. }
            | Self::PriorityChanged { issue_id, .. }
            | Self::CommentAdded { issue_id, .. }
            | Self::Deleted { issue_id } => Some(*issue_id),
            Self::Failed { issue_id, .. } => *issue_id,
        }
    }

    /// Short human-readable text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Created { .. } => "Issue created successfully".to_string(),
            Self::Updated { .. } => "Issue updated successfully".to_string(),
            Self::StatusChanged { to, .. } => format!("Issue moved to {}", to.title()),
            Self::PriorityChanged { .. } => "Priority updated successfully".to_string(),
            Self::CommentAdded { .. } => "Comment added".to_string(),
            Self::Deleted { .. } => "Issue deleted".to_string(),
            Self::Failed { action, .. } => format!("Failed to {action}"),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Receiver of workspace notices.
pub trait Notifier {
    fn notify(&self, notice: &Notice);
}

/// Writes every notice to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        let issue_id = notice.issue_id().map(|id| id.get());
        match notice {
            Notice::Failed { reason, .. } => {
                warn!(issue_id, reason = %reason, "{}", notice.message());
            }
            _ => info!(issue_id, "{}", notice.message()),
        }
    }
}

/// Keeps every notice in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    notices: Rc<RefCell<Vec<Notice>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.notices
            .borrow()
            .iter()
            .filter(|notice| notice.level() == Level::Error)
            .count()
    }

    pub fn clear(&self) {
        self.notices.borrow_mut().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.borrow_mut().push(notice.clone());
    }
}
