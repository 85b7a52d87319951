//! `fb search`: find issues by text and show where the title matched.

use super::Session;
use crate::output::{fail, mark_segments, render_mode};
use clap::Args;
use flowboard_core::model::{Issue, IssueId, Status};
use flowboard_core::query::{MatchSpan, highlight, locate_matches, search_issues};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to look for in title, description, labels, assignee, and reporter.
    pub query: String,

    /// Search the loaded issues instead of asking the database. Folds
    /// non-ASCII case too.
    #[arg(long)]
    pub local: bool,
}

#[derive(Debug, Serialize)]
struct SearchHit {
    id: IssueId,
    status: Status,
    title: String,
    /// Byte ranges of the query inside `title`.
    title_matches: Vec<MatchSpan>,
}

impl SearchHit {
    fn new(issue: Issue, query: &str) -> Self {
        Self {
            title_matches: locate_matches(&issue.title, query),
            id: issue.id,
            status: issue.status,
            title: issue.title,
        }
    }
}

pub fn run_search(args: &SearchArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let session = Session::open(project_root, cli_json)?;
    let output = session.output;
    let issues = if args.local {
        search_issues(&session.workspace.store().snapshot(), &args.query)
    } else {
        session
            .workspace
            .search_backend(&args.query)
            .map_err(|err| fail(output, &err))?
    };
    let hits: Vec<SearchHit> = issues
        .into_iter()
        .map(|issue| SearchHit::new(issue, &args.query))
        .collect();

    render_mode(
        output,
        &hits,
        |hits, w| {
            for hit in hits {
                writeln!(w, "{}\t{}\t{}", hit.id, hit.status, hit.title)?;
            }
            Ok(())
        },
        |hits, w| {
            if hits.is_empty() {
                return writeln!(w, "No issues match \"{}\"", args.query);
            }
            for hit in hits {
                let marked = mark_segments(&highlight(&hit.title, &args.query), "\x1b[1m", "\x1b[0m");
                writeln!(w, "#{:<4} {:<12} {marked}", hit.id.to_string(), hit.status.title())?;
            }
            Ok(())
        },
    )
}
