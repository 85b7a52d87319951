//! Bookkeeping for locally applied, not yet acknowledged mutations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{Field, FieldValue, Issue, IssueId, IssuePatch};

/// Handle for one staged mutation, used to settle it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// One field as it was before and after a staged mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub prior: FieldValue,
    pub next: FieldValue,
}

impl FieldChange {
    #[must_use]
    pub const fn field(&self) -> Field {
        self.next.field()
    }

    /// Whether `issue` still shows the value this mutation wrote, i.e. no
    /// later local edit has touched the field.
    #[must_use]
    pub fn still_applied(&self, issue: &Issue) -> bool {
        self.next.is_current(issue)
    }
}

/// A mutation applied to the store and awaiting the backend's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMutation {
    pub ticket: Ticket,
    pub issue_id: IssueId,
    pub changes: Vec<FieldChange>,
    pub prior_updated_at: DateTime<Utc>,
    pub applied_updated_at: DateTime<Utc>,
}

impl PendingMutation {
    /// The patch to send to the backend: every field at its new value.
    #[must_use]
    pub fn outgoing_patch(&self) -> IssuePatch {
        IssuePatch::from_values(self.changes.iter().map(|change| change.next.clone()))
    }

    #[must_use]
    pub fn fields(&self) -> Vec<Field> {
        self.changes.iter().map(FieldChange::field).collect()
    }
}

/// Open mutations keyed by ticket, in staging order.
#[derive(Debug, Default)]
pub struct Ledger {
    last_ticket: u64,
    pending: BTreeMap<Ticket, PendingMutation>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation and hand out its ticket. Tickets are never reused.
    pub fn record(
        &mut self,
        issue_id: IssueId,
        changes: Vec<FieldChange>,
        prior_updated_at: DateTime<Utc>,
        applied_updated_at: DateTime<Utc>,
    ) -> Ticket {
        self.last_ticket += 1;
        let ticket = Ticket(self.last_ticket);
        self.pending.insert(
            ticket,
            PendingMutation {
                ticket,
                issue_id,
                changes,
                prior_updated_at,
                applied_updated_at,
            },
        );
        ticket
    }

    #[must_use]
    pub fn get(&self, ticket: Ticket) -> Option<&PendingMutation> {
        self.pending.get(&ticket)
    }

    /// Remove a mutation for settlement. `None` when unknown or already taken.
    pub fn take(&mut self, ticket: Ticket) -> Option<PendingMutation> {
        self.pending.remove(&ticket)
    }

    /// Open mutations for one issue, oldest first.
    pub fn pending_for(&self, issue_id: IssueId) -> impl Iterator<Item = &PendingMutation> {
        self.pending
            .values()
            .filter(move |mutation| mutation.issue_id == issue_id)
    }

    pub fn pending_for_mut(
        &mut self,
        issue_id: IssueId,
    ) -> impl Iterator<Item = &mut PendingMutation> {
        self.pending
            .values_mut()
            .filter(move |mutation| mutation.issue_id == issue_id)
    }

    /// Pass a rolled-back mutation's prior timestamp to the pending
    /// mutation staged on top of it.
    pub fn hand_down_prior(&mut self, rolled_back: &PendingMutation) {
        if let Some(next) = self
            .pending_for_mut(rolled_back.issue_id)
            .find(|mutation| mutation.prior_updated_at == rolled_back.applied_updated_at)
        {
            next.prior_updated_at = rolled_back.prior_updated_at;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldChange, Ledger};
    use crate::model::{FieldValue, IssueId, IssuePatch, Priority, Status};
    use chrono::{Duration, TimeZone, Utc};

    fn status_change(from: Status, to: Status) -> FieldChange {
        FieldChange {
            prior: FieldValue::Status(from),
            next: FieldValue::Status(to),
        }
    }

    #[test]
    fn tickets_are_unique_and_taken_once() {
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let mut ledger = Ledger::new();
        let a = ledger.record(IssueId(1), vec![], at, at);
        let b = ledger.record(IssueId(1), vec![], at, at);
        assert_ne!(a, b);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.take(a).is_some());
        assert!(ledger.take(a).is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn pending_for_filters_by_issue_in_order() {
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let mut ledger = Ledger::new();
        let first = ledger.record(IssueId(1), vec![], at, at);
        ledger.record(IssueId(2), vec![], at, at);
        let third = ledger.record(IssueId(1), vec![], at, at + Duration::seconds(1));
        let tickets: Vec<_> = ledger.pending_for(IssueId(1)).map(|m| m.ticket).collect();
        assert_eq!(tickets, vec![first, third]);
    }

    #[test]
    fn rollback_hands_prior_timestamp_to_stacked_mutation() {
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let mut ledger = Ledger::new();
        let first = ledger.record(IssueId(1), vec![], at, at + Duration::seconds(1));
        let second = ledger.record(
            IssueId(1),
            vec![],
            at + Duration::seconds(1),
            at + Duration::seconds(2),
        );
        let rolled_back = ledger.take(first).unwrap();
        ledger.hand_down_prior(&rolled_back);
        assert_eq!(ledger.get(second).unwrap().prior_updated_at, at);
    }

    #[test]
    fn outgoing_patch_carries_next_values() {
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let mut ledger = Ledger::new();
        let ticket = ledger.record(
            IssueId(7),
            vec![
                status_change(Status::Todo, Status::Review),
                FieldChange {
                    prior: FieldValue::Priority(Priority::Low),
                    next: FieldValue::Priority(Priority::High),
                },
            ],
            at,
            at,
        );
        let patch = ledger.get(ticket).unwrap().outgoing_patch();
        assert_eq!(
            patch,
            IssuePatch {
                status: Some(Status::Review),
                priority: Some(Priority::High),
                ..IssuePatch::default()
            }
        );
    }
}
