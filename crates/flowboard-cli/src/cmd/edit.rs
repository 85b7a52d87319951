//! `fb edit`: change several fields of an issue in one commit.

use super::{Session, parse_value};
use crate::output::{fail, issue_row, render_mode};
use clap::Args;
use flowboard_core::model::{IssueId, IssuePatch, IssueType, Priority, Status};
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct EditArgs {
    #[arg(value_parser = parse_value::<IssueId>)]
    pub id: IssueId,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short = 't', long = "type", value_parser = parse_value::<IssueType>)]
    pub issue_type: Option<IssueType>,

    #[arg(short, long, value_parser = parse_value::<Priority>)]
    pub priority: Option<Priority>,

    #[arg(short, long, value_parser = parse_value::<Status>)]
    pub status: Option<Status>,

    /// New assignee; pass an empty string to unassign.
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Replace all labels (comma-separated or repeated).
    #[arg(short, long, value_delimiter = ',')]
    pub label: Option<Vec<String>>,
}

impl EditArgs {
    fn patch(&self) -> IssuePatch {
        IssuePatch {
            title: self.title.clone(),
            description: self.description.clone(),
            issue_type: self.issue_type,
            priority: self.priority,
            status: self.status,
            assignee: self.assignee.clone().map(Some),
            labels: self.label.clone(),
            comments: None,
        }
    }
}

pub fn run_edit(args: &EditArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let mut session = Session::open(project_root, cli_json)?;
    let output = session.output;
    let patch = args.patch();
    if patch.is_empty() {
        anyhow::bail!("nothing to change: pass at least one field flag");
    }
    let issue = session
        .workspace
        .edit_issue(args.id, patch)
        .map_err(|err| fail(output, &err))?;
    render_mode(
        output,
        &issue,
        |issue, w| issue_row(w, issue),
        |issue, w| writeln!(w, "Updated issue #{}: {}", issue.id, issue.title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: EditArgs,
    }

    #[test]
    fn only_given_flags_enter_the_patch() {
        let w = Wrapper::parse_from(["test", "#7", "--title", "Renamed", "-a", ""]);
        let patch = w.args.patch();
        assert_eq!(w.args.id, IssueId(7));
        assert_eq!(patch.title.as_deref(), Some("Renamed"));
        assert_eq!(patch.assignee, Some(Some(String::new())));
        assert!(patch.status.is_none());
        assert!(patch.labels.is_none());
    }

    #[test]
    fn no_flags_is_an_empty_patch() {
        let w = Wrapper::parse_from(["test", "7"]);
        assert!(w.args.patch().is_empty());
    }
}
