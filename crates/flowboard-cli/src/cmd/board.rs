//! `fb board`: issues grouped into workflow columns.

use super::Session;
use super::list::ListArgs;
use crate::output::{issue_row, pretty_section, render_mode};
use clap::Args;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct BoardArgs {
    #[command(flatten)]
    pub view: ListArgs,
}

pub fn run_board(args: &BoardArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let session = Session::open(project_root, cli_json)?;
    let query = args.view.view_query(session.config.project.view.sort_spec());
    let columns = session.workspace.board(&query);

    render_mode(
        session.output,
        &columns,
        |columns, w| {
            for column in columns {
                for issue in &column.issues {
                    issue_row(w, issue)?;
                }
            }
            Ok(())
        },
        |columns, w| {
            for column in columns {
                pretty_section(w, &format!("{} ({})", column.title, column.len()))?;
                for issue in &column.issues {
                    writeln!(
                        w,
                        "  #{:<4} [{}] {}",
                        issue.id.to_string(),
                        issue.priority,
                        issue.title
                    )?;
                }
                writeln!(w)?;
            }
            Ok(())
        },
    )
}
