//! `fb delete`: remove an issue permanently.

use super::{Session, parse_value};
use crate::output::{fail, render};
use clap::Args;
use flowboard_core::model::IssueId;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(value_parser = parse_value::<IssueId>)]
    pub id: IssueId,
}

#[derive(Debug, Serialize)]
struct DeleteReport {
    issue_id: IssueId,
    deleted: bool,
}

pub fn run_delete(args: &DeleteArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let mut session = Session::open(project_root, cli_json)?;
    let output = session.output;
    session
        .workspace
        .delete_issue(args.id)
        .map_err(|err| fail(output, &err))?;
    let report = DeleteReport {
        issue_id: args.id,
        deleted: true,
    };
    render(output, &report, |r, w| writeln!(w, "Deleted issue #{}", r.issue_id))
}
