//! End-to-end flows through a workspace backed by the in-memory gateway.

use chrono::{DateTime, Duration, TimeZone, Utc};
use flowboard_core::clock::ManualClock;
use flowboard_core::codec::{decode_comments, encode_comments};
use flowboard_core::gateway::InMemoryGateway;
use flowboard_core::model::{
    Comment, CommentId, Issue, IssueDraft, IssueId, IssuePatch, IssueType, Priority, Status,
};
use flowboard_core::notify::{Notice, RecordingNotifier};
use flowboard_core::query::{FilterSet, SortKey, SortSpec, ViewQuery, apply_filters, sort_issues};
use flowboard_core::store::IssueStore;
use flowboard_core::sync::SettleOutcome;
use flowboard_core::workflow::{DragSession, TransitionOutcome};
use flowboard_core::{CoreError, GatewayError, Workspace};
use std::rc::Rc;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
}

fn issue(id: u64, title: &str, priority: Priority, status: Status) -> Issue {
    let at = start() - Duration::days(i64::try_from(id).unwrap());
    Issue {
        id: IssueId(id),
        title: title.into(),
        description: String::new(),
        issue_type: IssueType::Task,
        priority,
        status,
        assignee: None,
        reporter: "Current User".into(),
        labels: vec![],
        comments: vec![],
        created_at: at,
        updated_at: at,
    }
}

fn seeded_workspace(seed: Vec<Issue>) -> (Workspace<InMemoryGateway>, RecordingNotifier) {
    let clock = Rc::new(ManualClock::starting_at(start()));
    let mut backend = IssueStore::with_clock(Rc::clone(&clock));
    backend.replace_all(seed);
    let notifier = RecordingNotifier::new();
    let mut ws = Workspace::new(
        IssueStore::with_clock(clock),
        InMemoryGateway::with_store(backend),
    )
    .with_notifier(notifier.clone())
    .with_author("Sarah Chen");
    ws.load().unwrap();
    (ws, notifier)
}

#[test]
fn created_issue_gets_defaults_and_next_id() {
    let (mut ws, notifier) = seeded_workspace(vec![
        issue(1, "Login fails", Priority::Medium, Status::Todo),
        issue(2, "Dark mode", Priority::Low, Status::Backlog),
        issue(7, "Export CSV", Priority::High, Status::Done),
    ]);

    let created = ws
        .create_issue(IssueDraft {
            issue_type: Some(IssueType::Bug),
            priority: Some(Priority::High),
            ..IssueDraft::titled("Crash on save")
        })
        .unwrap();

    assert_eq!(created.id, IssueId(8));
    assert_eq!(created.status, Status::Backlog);
    assert_eq!(created.priority, Priority::High);
    assert_eq!(created.issue_type, IssueType::Bug);
    assert!(created.labels.is_empty());
    assert!(created.comments.is_empty());
    assert_eq!(created.reporter, "Current User");
    assert_eq!(ws.get(IssueId(8)).unwrap(), created);
    assert_eq!(
        notifier.notices(),
        vec![Notice::Created {
            issue_id: IssueId(8)
        }]
    );
}

#[test]
fn blank_title_is_rejected_before_backend() {
    let (mut ws, _) = seeded_workspace(vec![]);
    ws.gateway().set_offline(true);
    let err = ws.create_issue(IssueDraft::titled("   ")).unwrap_err();
    assert!(matches!(err, CoreError::Validation { field: "title", .. }));
}

#[test]
fn priority_sort_uses_severity_rank() {
    let issues = vec![
        issue(1, "a", Priority::Low, Status::Todo),
        issue(2, "b", Priority::Critical, Status::Todo),
    ];

    let asc = sort_issues(&issues, SortSpec::asc(SortKey::Priority));
    let desc = sort_issues(&issues, SortSpec::desc(SortKey::Priority));

    let priorities = |list: &[Issue]| list.iter().map(|i| i.priority).collect::<Vec<_>>();
    assert_eq!(priorities(&asc), vec![Priority::Low, Priority::Critical]);
    assert_eq!(priorities(&desc), vec![Priority::Critical, Priority::Low]);
}

#[test]
fn status_filter_selects_matching_issues() {
    let issues = vec![
        issue(1, "open", Priority::Low, Status::Todo),
        issue(2, "closed", Priority::Low, Status::Done),
        issue(3, "wip", Priority::Low, Status::InProgress),
    ];

    let done = apply_filters(&issues, &FilterSet::new().with_status([Status::Done]));
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, IssueId(2));
}

#[test]
fn comment_blob_has_author_prefix() {
    let comments = vec![Comment {
        id: CommentId::from("c1"),
        author: "Sarah Chen".into(),
        content: "Looks good".into(),
        created_at: start(),
    }];

    let blob = encode_comments(&comments);
    assert_eq!(blob, "Sarah Chen: Looks good\n");

    let decoded = decode_comments(&blob, start());
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].author, "Sarah Chen");
    assert_eq!(decoded[0].content, "Looks good");
}

#[test]
fn failed_transition_restores_status_and_timestamp() {
    let (mut ws, notifier) = seeded_workspace(vec![issue(1, "Login fails", Priority::Medium, Status::Todo)]);
    let before = ws.get(IssueId(1)).unwrap();

    ws.gateway().fail_next(1);
    let err = ws.transition(IssueId(1), Status::Done).unwrap_err();

    assert!(matches!(err, CoreError::Persistence(GatewayError::Rejected(_))));
    assert_eq!(ws.get(IssueId(1)).unwrap(), before);
    assert_eq!(notifier.failures(), 1);
    assert_eq!(
        notifier.notices().last().map(Notice::message).as_deref(),
        Some("Failed to update issue status")
    );
}

#[test]
fn failed_transition_keeps_concurrent_title_edit() {
    let (mut ws, _) = seeded_workspace(vec![issue(1, "Login fails", Priority::Medium, Status::Todo)]);
    let before = ws.get(IssueId(1)).unwrap();

    // Move is applied locally and left in flight.
    let staged = ws.stage_update(IssueId(1), IssuePatch::status(Status::Done)).unwrap();
    assert_eq!(staged.issue.status, Status::Done);

    // Title edit completes while the move is pending.
    let edited = ws
        .edit_issue(IssueId(1), IssuePatch::title("Login fails on Safari"))
        .unwrap();

    let outcome = ws.settle(
        staged.ticket,
        Err(GatewayError::Unavailable("timeout".into())),
    );
    assert_eq!(outcome.restored(), &[flowboard_core::model::Field::Status]);

    let after = ws.get(IssueId(1)).unwrap();
    assert_eq!(after.status, before.status);
    assert_eq!(after.title, "Login fails on Safari");
    assert_eq!(after.updated_at, edited.updated_at);
    assert!(ws.ledger().is_empty());
}

#[test]
fn drag_between_columns_moves_issue() {
    let (mut ws, notifier) = seeded_workspace(vec![issue(1, "Login fails", Priority::Medium, Status::Todo)]);

    let same_column = DragSession::start(&ws.get(IssueId(1)).unwrap());
    assert_eq!(ws.drop_issue(same_column, Some(Status::Todo)).unwrap(), None);

    let outside = DragSession::start(&ws.get(IssueId(1)).unwrap());
    assert_eq!(ws.drop_issue(outside, None).unwrap(), None);
    assert!(notifier.notices().is_empty());

    let drag = DragSession::start(&ws.get(IssueId(1)).unwrap());
    let outcome = ws.drop_issue(drag, Some(Status::Review)).unwrap();
    assert_eq!(
        outcome,
        Some(TransitionOutcome::Moved {
            from: Status::Todo,
            to: Status::Review
        })
    );
    assert_eq!(ws.get(IssueId(1)).unwrap().status, Status::Review);
    assert_eq!(
        ws.gateway().store().get(IssueId(1)).unwrap().status,
        Status::Review
    );
    assert_eq!(
        notifier.notices().last().map(Notice::message).as_deref(),
        Some("Issue moved to Review")
    );
}

#[test]
fn board_groups_filtered_view_by_status() {
    let (ws, _) = seeded_workspace(vec![
        issue(1, "Login fails", Priority::High, Status::Todo),
        issue(2, "Signup fails", Priority::Low, Status::Todo),
        issue(3, "Docs", Priority::High, Status::Done),
    ]);

    let query = ViewQuery::new().filtered(FilterSet::new().with_priority([Priority::High]));
    let board = ws.board(&query);

    assert_eq!(board.len(), Status::ALL.len());
    let todo = board.iter().find(|c| c.status == Status::Todo).unwrap();
    assert_eq!(todo.issues.len(), 1);
    assert_eq!(todo.issues[0].id, IssueId(1));
    let done = board.iter().find(|c| c.status == Status::Done).unwrap();
    assert_eq!(done.len(), 1);
}

#[test]
fn comment_then_failed_comment() {
    let (mut ws, _) = seeded_workspace(vec![issue(1, "Login fails", Priority::Medium, Status::Todo)]);

    let first = ws.add_comment(IssueId(1), "  Reproduced on 2.1  ").unwrap();
    assert_eq!(first.author, "Sarah Chen");
    assert_eq!(first.content, "Reproduced on 2.1");

    ws.gateway().fail_next(1);
    assert!(ws.add_comment(IssueId(1), "second").is_err());

    let comments = ws.get(IssueId(1)).unwrap().comments;
    assert_eq!(comments, vec![first]);
}

#[test]
fn settle_outcome_reports_discard_after_delete() {
    let (mut ws, _) = seeded_workspace(vec![issue(1, "Login fails", Priority::Medium, Status::Todo)]);
    let staged = ws.stage_update(IssueId(1), IssuePatch::priority(Priority::Critical)).unwrap();
    ws.delete_issue(IssueId(1)).unwrap();

    let outcome = ws.settle(staged.ticket, Err(GatewayError::NotFound(IssueId(1))));
    assert_eq!(outcome, SettleOutcome::Discarded { issue_id: IssueId(1) });
}
