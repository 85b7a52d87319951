//! `fb create`: add an issue to the board.

use super::{Session, parse_value};
use crate::output::{fail, issue_row, pretty_kv, render_mode};
use chrono::{Duration, Utc};
use clap::Args;
use flowboard_core::model::{Issue, IssueDraft, IssueId, IssueType, Priority, Status};
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title of the new issue.
    pub title: String,

    #[arg(short, long)]
    pub description: Option<String>,

    /// bug, feature, or task.
    #[arg(short = 't', long = "type", value_parser = parse_value::<IssueType>)]
    pub issue_type: Option<IssueType>,

    /// low, medium, high, or critical.
    #[arg(short, long, value_parser = parse_value::<Priority>)]
    pub priority: Option<Priority>,

    /// Starting column (defaults to backlog).
    #[arg(short, long, value_parser = parse_value::<Status>)]
    pub status: Option<Status>,

    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Labels to attach (comma-separated or repeated).
    #[arg(short, long, value_delimiter = ',')]
    pub label: Vec<String>,
}

impl CreateArgs {
    fn into_draft(self) -> IssueDraft {
        IssueDraft {
            description: self.description,
            issue_type: self.issue_type,
            priority: self.priority,
            status: self.status,
            assignee: self.assignee,
            labels: (!self.label.is_empty()).then_some(self.label),
            ..IssueDraft::titled(self.title)
        }
    }
}

pub fn run_create(args: CreateArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let mut session = Session::open(project_root, cli_json)?;
    let output = session.output;
    let issue = session
        .workspace
        .create_issue(args.into_draft())
        .map_err(|err| fail(output, &err))?;

    render_mode(
        output,
        &issue,
        |issue, w| issue_row(w, issue),
        |issue, w| {
            writeln!(w, "Created issue #{}", issue.id)?;
            pretty_kv(w, "Title", &issue.title)?;
            pretty_kv(w, "Status", issue.status.title())?;
            pretty_kv(w, "Priority", issue.priority.as_str())
        },
    )
}

/// A small sample board used by `fb init --demo`.
pub fn demo_issues(reporter: &str) -> Vec<Issue> {
    let now = Utc::now();
    let rows: [(&str, IssueType, Priority, Status, Option<&str>, &[&str], i64); 6] = [
        ("Login fails on Safari", IssueType::Bug, Priority::Critical, Status::InProgress, Some("Sarah Chen"), &["auth", "frontend"], 1),
        ("Add dark mode", IssueType::Feature, Priority::Medium, Status::Backlog, None, &["ui"], 9),
        ("Export board as CSV", IssueType::Feature, Priority::Low, Status::Todo, Some("David Kim"), &["reporting"], 6),
        ("Search ignores labels", IssueType::Bug, Priority::High, Status::Review, Some("Alex Rivera"), &["search"], 2),
        ("Upgrade SQLite", IssueType::Task, Priority::Medium, Status::Done, Some("Carlos Rodriguez"), &[], 14),
        ("Write onboarding guide", IssueType::Task, Priority::Low, Status::Todo, None, &["docs"], 4),
    ];
    rows.iter()
        .zip(1_u64..)
        .map(|(&(title, issue_type, priority, status, assignee, labels, age_days), id)| {
            let created_at = now - Duration::days(age_days);
            Issue {
                id: IssueId(id),
                title: title.to_string(),
                description: String::new(),
                issue_type,
                priority,
                status,
                assignee: assignee.map(str::to_string),
                reporter: reporter.to_string(),
                labels: labels.iter().map(|label| (*label).to_string()).collect(),
                comments: vec![],
                created_at,
                updated_at: created_at + Duration::hours(age_days),
            }
        })
        .collect()
}
