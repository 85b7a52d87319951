//! `fb move`: move an issue to another workflow column.

use super::{Session, parse_value};
use crate::output::{fail, render_mode};
use clap::Args;
use flowboard_core::model::{IssueId, Status};
use flowboard_core::workflow::TransitionOutcome;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct MoveArgs {
    #[arg(value_parser = parse_value::<IssueId>)]
    pub id: IssueId,

    /// Target column: backlog, todo, in-progress, review, or done.
    #[arg(value_parser = parse_value::<Status>)]
    pub status: Status,
}

#[derive(Debug, Serialize)]
struct MoveReport {
    issue_id: IssueId,
    #[serde(flatten)]
    outcome: TransitionOutcome,
}

pub fn run_move(args: &MoveArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let mut session = Session::open(project_root, cli_json)?;
    let output = session.output;
    let outcome = session
        .workspace
        .transition(args.id, args.status)
        .map_err(|err| fail(output, &err))?;

    let report = MoveReport {
        issue_id: args.id,
        outcome,
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "{}\t{}\t{}", r.issue_id, r.outcome.status(), r.outcome.is_moved()),
        |r, w| match r.outcome {
            TransitionOutcome::Moved { from, to } => {
                writeln!(w, "Moved #{} from {} to {}", r.issue_id, from.title(), to.title())
            }
            TransitionOutcome::Unchanged { status } => {
                writeln!(w, "#{} is already in {}", r.issue_id, status.title())
            }
        },
    )
}
