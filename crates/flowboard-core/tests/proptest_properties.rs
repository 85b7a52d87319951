use chrono::{TimeZone, Utc};
use flowboard_core::clock::ManualClock;
use flowboard_core::codec::{decode_comments, encode_comments};
use flowboard_core::gateway::InMemoryGateway;
use flowboard_core::model::{IssueDraft, IssuePatch};
use flowboard_core::query::{apply_filters, highlight, locate_matches, search_issues, sort_issues};
use flowboard_core::store::IssueStore;
use flowboard_core::workflow::TransitionOutcome;
use flowboard_core::Workspace;
use proptest::prelude::*;
use std::rc::Rc;

use generators::*;

fn workspace() -> Workspace<InMemoryGateway> {
    let clock = Rc::new(ManualClock::starting_at(
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    ));
    Workspace::new(
        IssueStore::with_clock(Rc::clone(&clock)),
        InMemoryGateway::with_store(IssueStore::with_clock(clock)),
    )
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn filtering_is_idempotent(issues in arb_issues(12), filters in arb_filter_set()) {
        let once = apply_filters(&issues, &filters);
        let twice = apply_filters(&once, &filters);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn filtering_keeps_input_order(issues in arb_issues(12), filters in arb_filter_set()) {
        let kept = apply_filters(&issues, &filters);
        let ids: Vec<u64> = kept.iter().map(|i| i.id.get()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        prop_assert_eq!(ids, sorted);
    }

    #[test]
    fn sorting_is_idempotent(issues in arb_issues(12), spec in arb_sort_spec()) {
        let once = sort_issues(&issues, spec);
        let twice = sort_issues(&once, spec);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sorting_is_stable_and_ordered(issues in arb_issues(12), spec in arb_sort_spec()) {
        let sorted = sort_issues(&issues, spec);
        prop_assert_eq!(sorted.len(), issues.len());
        for pair in sorted.windows(2) {
            let ordering = spec.compare(&pair[0], &pair[1]);
            prop_assert!(ordering != std::cmp::Ordering::Greater);
            if ordering == std::cmp::Ordering::Equal {
                // ids were generated in input order
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[test]
    fn codec_round_trips_author_and_content(comments in prop::collection::vec(arb_comment(), 0..6)) {
        let blob = encode_comments(&comments);
        let decoded = decode_comments(&blob, base_time());
        let expected: Vec<(&str, &str)> =
            comments.iter().map(|c| (c.author.as_str(), c.content.as_str())).collect();
        let actual: Vec<(&str, &str)> =
            decoded.iter().map(|c| (c.author.as_str(), c.content.as_str())).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn match_spans_are_well_formed(text in arb_text(), query in arb_query()) {
        let spans = locate_matches(&text, &query);
        let mut cursor = 0;
        for span in &spans {
            prop_assert!(span.start >= cursor && span.start < span.end);
            prop_assert!(text.is_char_boundary(span.start) && text.is_char_boundary(span.end));
            prop_assert_eq!(text[span.start..span.end].to_lowercase(), query.to_lowercase());
            cursor = span.end;
        }
        prop_assert_eq!(
            spans.is_empty(),
            !text.to_lowercase().contains(&query.to_lowercase())
        );
        let rebuilt: String = highlight(&text, &query).iter().map(|s| s.text).collect();
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn search_ignores_case(issues in arb_issues(8), query in "[a-z]{1,3}") {
        let lower = search_issues(&issues, &query);
        let upper = search_issues(&issues, &query.to_uppercase());
        prop_assert_eq!(lower, upper);
    }

    #[test]
    fn transitions_advance_updated_at(targets in prop::collection::vec(arb_status(), 1..8)) {
        let mut ws = workspace();
        let id = ws.create_issue(IssueDraft::titled("tracked")).unwrap().id;
        for target in targets {
            let before = ws.get(id).unwrap();
            let outcome = ws.transition(id, target).unwrap();
            let after = ws.get(id).unwrap();
            prop_assert_eq!(after.status, target);
            match outcome {
                TransitionOutcome::Unchanged { .. } => prop_assert_eq!(after, before),
                TransitionOutcome::Moved { .. } => prop_assert!(after.updated_at > before.updated_at),
            }
        }
    }

    #[test]
    fn failed_edit_restores_issue_exactly(
        title in "[A-Za-z]{1,10}",
        status in arb_status(),
        priority in arb_priority(),
        assignee in arb_assignee(),
    ) {
        let mut ws = workspace();
        let id = ws.create_issue(IssueDraft::titled("original")).unwrap().id;
        let before = ws.get(id).unwrap();
        ws.gateway().fail_next(1);
        let patch = IssuePatch {
            title: Some(title),
            status: Some(status),
            priority: Some(priority),
            assignee: Some(assignee),
            ..IssuePatch::default()
        };
        prop_assert!(ws.edit_issue(id, patch).is_err());
        prop_assert_eq!(ws.get(id).unwrap(), before);
        prop_assert!(ws.ledger().is_empty());
    }
}
