//! `fb priority`: change an issue's priority.

use super::{Session, parse_value};
use crate::output::{fail, issue_row, render_mode};
use clap::Args;
use flowboard_core::model::{IssueId, Priority};
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct PriorityArgs {
    #[arg(value_parser = parse_value::<IssueId>)]
    pub id: IssueId,

    /// low, medium, high, or critical.
    #[arg(value_parser = parse_value::<Priority>)]
    pub priority: Priority,
}

pub fn run_priority(args: &PriorityArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let mut session = Session::open(project_root, cli_json)?;
    let output = session.output;
    let issue = session
        .workspace
        .update_priority(args.id, args.priority)
        .map_err(|err| fail(output, &err))?;
    render_mode(
        output,
        &issue,
        |issue, w| issue_row(w, issue),
        |issue, w| writeln!(w, "#{} priority is now {}", issue.id, issue.priority),
    )
}
