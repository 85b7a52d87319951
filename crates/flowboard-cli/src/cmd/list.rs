//! `fb list`: filtered, searched, and sorted issue listing.

use super::{Session, parse_value};
use crate::output::{OutputMode, issue_table, render_mode};
use clap::Args;
use flowboard_core::model::{IssueType, Priority, Status};
use flowboard_core::query::{FilterSet, SortDirection, SortKey, SortSpec, ViewQuery};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Keep only these statuses (comma-separated or repeated).
    #[arg(short, long, value_delimiter = ',', value_parser = parse_value::<Status>)]
    pub status: Vec<Status>,

    #[arg(short, long, value_delimiter = ',', value_parser = parse_value::<Priority>)]
    pub priority: Vec<Priority>,

    #[arg(short = 't', long = "type", value_delimiter = ',', value_parser = parse_value::<IssueType>)]
    pub issue_type: Vec<IssueType>,

    /// Keep only these assignees. An empty value selects unassigned issues.
    #[arg(short, long)]
    pub assignee: Vec<String>,

    /// Case-insensitive text to look for.
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// updated, created, title, priority, or status.
    #[arg(long, value_parser = parse_value::<SortKey>)]
    pub sort: Option<SortKey>,

    /// Sort ascending instead of the configured direction.
    #[arg(long, conflicts_with = "desc")]
    pub asc: bool,

    #[arg(long)]
    pub desc: bool,

    /// Maximum issues to show.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl ListArgs {
    /// Build the view query, falling back to `default_sort` for anything the
    /// flags leave open.
    pub fn view_query(&self, default_sort: SortSpec) -> ViewQuery {
        let direction = if self.asc {
            SortDirection::Asc
        } else if self.desc {
            SortDirection::Desc
        } else {
            default_sort.direction
        };
        ViewQuery::new()
            .filtered(
                FilterSet::new()
                    .with_status(self.status.iter().copied())
                    .with_priority(self.priority.iter().copied())
                    .with_type(self.issue_type.iter().copied())
                    .with_assignee(self.assignee.iter().map(|name| name.trim().to_string())),
            )
            .searching(self.search.clone().unwrap_or_default())
            .sorted(SortSpec::new(self.sort.unwrap_or(default_sort.key), direction))
    }
}

pub fn run_list(args: &ListArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let session = Session::open(project_root, cli_json)?;
    let query = args.view_query(session.config.project.view.sort_spec());
    let mut issues = session.workspace.view(&query);
    if let Some(limit) = args.limit {
        issues.truncate(limit);
    }
    let pretty = session.output == OutputMode::Pretty;
    render_mode(
        session.output,
        &issues,
        |issues, w| issue_table(w, issues, false),
        |issues, w| issue_table(w, issues, pretty),
    )
}
