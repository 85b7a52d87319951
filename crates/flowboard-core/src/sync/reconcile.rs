//! Field-level merge of a backend answer into the local issue.
//!
//! Both directions follow the same rule: a field is only touched while it
//! still holds the value the mutation wrote. Anything a later local edit
//! changed is left alone, so the most recent local state always wins.

use serde::Serialize;

use super::ledger::PendingMutation;
use crate::model::{Field, FieldValue, Issue};

/// Which fields a settlement rewrote and which it left to later edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Fields set to the server value (confirm) or the prior value (rollback).
    pub touched: Vec<Field>,
    /// Fields skipped because a later local edit superseded them.
    pub superseded: Vec<Field>,
    /// Whether `updated_at` was rewritten.
    pub timestamp_touched: bool,
}

/// Adopt the server's view of the fields this mutation changed.
///
/// `updated_at` follows the server only while no later local mutation has
/// refreshed it, and only when the server value keeps it moving forward.
pub fn confirm(issue: &mut Issue, mutation: &PendingMutation, server: &Issue) -> MergeReport {
    let mut report = MergeReport::default();
    for change in &mutation.changes {
        let field = change.field();
        if change.still_applied(issue) {
            FieldValue::read(server, field).write(issue);
            report.touched.push(field);
        } else {
            report.superseded.push(field);
        }
    }
    if issue.updated_at == mutation.applied_updated_at
        && server.updated_at > mutation.prior_updated_at
    {
        issue.updated_at = server.updated_at;
        report.timestamp_touched = true;
    }
    report
}

/// Undo exactly the fields this mutation changed.
pub fn rollback(issue: &mut Issue, mutation: &PendingMutation) -> MergeReport {
    let mut report = MergeReport::default();
    for change in &mutation.changes {
        let field = change.field();
        if change.still_applied(issue) {
            change.prior.clone().write(issue);
            report.touched.push(field);
        } else {
            report.superseded.push(field);
        }
    }
    if issue.updated_at == mutation.applied_updated_at {
        issue.updated_at = mutation.prior_updated_at;
        report.timestamp_touched = true;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::{confirm, rollback};
    use crate::model::{Field, FieldValue, Issue, IssueId, IssueType, Priority, Status};
    use crate::sync::ledger::{FieldChange, Ledger, PendingMutation};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(sec: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::seconds(sec)
    }

    fn issue() -> Issue {
        Issue {
            id: IssueId(1),
            title: "Login fails".into(),
            description: String::new(),
            issue_type: IssueType::Bug,
            priority: Priority::High,
            status: Status::Review,
            assignee: None,
            reporter: "Current User".into(),
            labels: vec![],
            comments: vec![],
            created_at: t(0),
            updated_at: t(10),
        }
    }

    fn transition(from: Status, to: Status, prior_at: i64, applied_at: i64) -> PendingMutation {
        let mut ledger = Ledger::new();
        let ticket = ledger.record(
            IssueId(1),
            vec![FieldChange {
                prior: FieldValue::Status(from),
                next: FieldValue::Status(to),
            }],
            t(prior_at),
            t(applied_at),
        );
        ledger.take(ticket).unwrap()
    }

    #[test]
    fn rollback_restores_untouched_field_and_timestamp() {
        let mutation = transition(Status::Todo, Status::Review, 5, 10);
        let mut local = issue();
        let report = rollback(&mut local, &mutation);
        assert_eq!(local.status, Status::Todo);
        assert_eq!(local.updated_at, t(5));
        assert_eq!(report.touched, vec![Field::Status]);
        assert!(report.timestamp_touched);
    }

    #[test]
    fn rollback_skips_superseded_field() {
        let mutation = transition(Status::Todo, Status::Review, 5, 10);
        let mut local = issue();
        local.status = Status::Done;
        local.updated_at = t(12);
        let report = rollback(&mut local, &mutation);
        assert_eq!(local.status, Status::Done);
        assert_eq!(local.updated_at, t(12));
        assert_eq!(report.superseded, vec![Field::Status]);
        assert!(!report.timestamp_touched);
    }

    #[test]
    fn rollback_keeps_later_timestamp_from_other_field_edit() {
        let mutation = transition(Status::Todo, Status::Review, 5, 10);
        let mut local = issue();
        local.title = "Login fails on Safari".into();
        local.updated_at = t(12);
        rollback(&mut local, &mutation);
        assert_eq!(local.status, Status::Todo);
        assert_eq!(local.title, "Login fails on Safari");
        assert_eq!(local.updated_at, t(12));
    }

    #[test]
    fn confirm_adopts_server_values_for_untouched_fields() {
        let mutation = transition(Status::Todo, Status::Review, 5, 10);
        let mut local = issue();
        let mut server = issue();
        server.updated_at = t(11);
        let report = confirm(&mut local, &mutation, &server);
        assert_eq!(local.status, Status::Review);
        assert_eq!(local.updated_at, t(11));
        assert!(report.timestamp_touched);
    }

    #[test]
    fn delayed_confirmation_never_overwrites_later_edit() {
        let mutation = transition(Status::Todo, Status::Review, 5, 10);
        let mut local = issue();
        local.status = Status::Done;
        local.updated_at = t(12);
        let mut server = issue();
        server.updated_at = t(11);
        let report = confirm(&mut local, &mutation, &server);
        assert_eq!(local.status, Status::Done);
        assert_eq!(local.updated_at, t(12));
        assert_eq!(report.superseded, vec![Field::Status]);
    }

    #[test]
    fn confirm_ignores_server_timestamp_that_would_move_backwards() {
        let mutation = transition(Status::Todo, Status::Review, 5, 10);
        let mut local = issue();
        let mut server = issue();
        server.updated_at = t(1);
        confirm(&mut local, &mutation, &server);
        assert_eq!(local.updated_at, t(10));
    }
}
