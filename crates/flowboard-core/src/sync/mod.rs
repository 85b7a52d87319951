//! Optimistic update protocol.
//!
//! A mutation runs in two phases so a caller can suspend between them:
//!
//! 1. **Stage**: the patch is applied to the store right away and recorded in
//!    the [`Ledger`] with the prior value of every field it changed.
//! 2. **Settle**: the backend's answer arrives. Success merges the server's
//!    values in with [`reconcile::confirm`]; failure undoes the mutation with
//!    [`reconcile::rollback`]. Both are per field and skip any field a later
//!    local edit has already overwritten.
//!
//! Settling a ticket twice, or a ticket that was never issued, is a no-op.

pub mod ledger;
pub mod reconcile;

use serde::Serialize;

use crate::model::{Field, Issue, IssueId, IssuePatch};

pub use ledger::{FieldChange, Ledger, PendingMutation, Ticket};
pub use reconcile::MergeReport;

/// A mutation that has been applied locally and awaits settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedUpdate {
    pub ticket: Ticket,
    /// The issue as it looks locally after the optimistic write.
    pub issue: Issue,
    /// What to send to the backend.
    pub patch: IssuePatch,
}

/// Result of settling a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettleOutcome {
    Confirmed { issue_id: IssueId, report: MergeReport },
    RolledBack { issue_id: IssueId, report: MergeReport },
    /// The issue was removed locally before the answer arrived.
    Discarded { issue_id: IssueId },
    /// Unknown or already settled ticket.
    Stale,
}

impl SettleOutcome {
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    /// Fields restored by a rollback; empty for every other outcome.
    #[must_use]
    pub fn restored(&self) -> &[Field] {
        match self {
            Self::RolledBack { report, .. } => &report.touched,
            _ => &[],
        }
    }
}
