//! `fb show`: one issue with its comments.

use super::{Session, parse_value};
use crate::output::{fail, pretty_kv, pretty_section, render_mode};
use clap::Args;
use flowboard_core::model::{Issue, IssueId};
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue id, with or without a leading `#`.
    #[arg(value_parser = parse_value::<IssueId>)]
    pub id: IssueId,
}

pub fn run_show(args: &ShowArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let session = Session::open(project_root, cli_json)?;
    let issue = session
        .workspace
        .get(args.id)
        .map_err(|err| fail(session.output, &err))?;
    render_mode(session.output, &issue, write_text, write_pretty)
}

fn write_text(issue: &Issue, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "id\t{}", issue.id)?;
    writeln!(w, "title\t{}", issue.title)?;
    writeln!(w, "status\t{}", issue.status)?;
    writeln!(w, "priority\t{}", issue.priority)?;
    writeln!(w, "type\t{}", issue.issue_type)?;
    writeln!(w, "assignee\t{}", issue.assignee.as_deref().unwrap_or("-"))?;
    writeln!(w, "reporter\t{}", issue.reporter)?;
    writeln!(w, "labels\t{}", issue.labels.join(","))?;
    writeln!(w, "updated\t{}", issue.updated_at.to_rfc3339())?;
    for comment in &issue.comments {
        writeln!(w, "comment\t{}\t{}", comment.author, comment.content)?;
    }
    Ok(())
}

fn write_pretty(issue: &Issue, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("#{} {}", issue.id, issue.title))?;
    pretty_kv(w, "Status", issue.status.title())?;
    pretty_kv(w, "Priority", issue.priority.as_str())?;
    pretty_kv(w, "Type", issue.issue_type.as_str())?;
    pretty_kv(w, "Assignee", issue.assignee.as_deref().unwrap_or("Unassigned"))?;
    pretty_kv(w, "Reporter", &issue.reporter)?;
    if !issue.labels.is_empty() {
        pretty_kv(w, "Labels", issue.labels.join(", "))?;
    }
    pretty_kv(w, "Created", issue.created_at.format("%Y-%m-%d %H:%M").to_string())?;
    pretty_kv(w, "Updated", issue.updated_at.format("%Y-%m-%d %H:%M").to_string())?;
    if !issue.description.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", issue.description)?;
    }
    if !issue.comments.is_empty() {
        writeln!(w)?;
        pretty_section(w, &format!("Comments ({})", issue.comments.len()))?;
        for comment in &issue.comments {
            writeln!(w, "{}: {}", comment.author, comment.content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flowboard_core::model::{Comment, CommentId, IssueType, Priority, Status};

    #[test]
    fn text_output_lists_comments_last() {
        let at = Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap();
        let issue = Issue {
            id: IssueId(3),
            title: "Login fails".into(),
            description: String::new(),
            issue_type: IssueType::Bug,
            priority: Priority::High,
            status: Status::Todo,
            assignee: None,
            reporter: "Current User".into(),
            labels: vec!["auth".into()],
            comments: vec![Comment {
                id: CommentId::sequential(1),
                author: "Sarah Chen".into(),
                content: "Looks good".into(),
                created_at: at,
            }],
            created_at: at,
            updated_at: at,
        };
        let mut buf = Vec::new();
        write_text(&issue, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("id\t3\n"));
        assert!(text.contains("assignee\t-\n"));
        assert!(text.ends_with("comment\tSarah Chen\tLooks good\n"));
    }
}
