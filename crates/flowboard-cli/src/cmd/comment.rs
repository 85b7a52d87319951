//! `fb comment`: append a comment to an issue.

use super::{Session, parse_value};
use crate::output::{fail, render_mode};
use clap::Args;
use flowboard_core::model::IssueId;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[arg(value_parser = parse_value::<IssueId>)]
    pub id: IssueId,

    /// Comment text. Several words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

pub fn run_comment(args: &CommentArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let mut session = Session::open(project_root, cli_json)?;
    let output = session.output;
    let comment = session
        .workspace
        .add_comment(args.id, &args.text.join(" "))
        .map_err(|err| fail(output, &err))?;
    render_mode(
        output,
        &comment,
        |c, w| writeln!(w, "{}\t{}\t{}", c.id, c.author, c.content),
        |c, w| writeln!(w, "Comment added to #{} by {}", args.id, c.author),
    )
}
