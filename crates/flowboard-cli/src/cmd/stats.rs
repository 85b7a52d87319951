//! `fb stats`: dashboard figures for the project.

use super::Session;
use crate::output::{issue_line, pretty_kv, pretty_section, render_mode};
use clap::Args;
use flowboard_core::query::DashboardStats;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Days counted as recent (defaults to the project config).
    #[arg(long)]
    pub recent_days: Option<u32>,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    project: String,
    completion_percent: u32,
    #[serde(flatten)]
    stats: DashboardStats,
}

pub fn run_stats(args: &StatsArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let session = Session::open(project_root, cli_json)?;
    let recent_days = args
        .recent_days
        .unwrap_or(session.config.project.dashboard.recent_days);
    let stats = session.workspace.stats(recent_days);
    let report = StatsReport {
        project: session.root.display().to_string(),
        completion_percent: stats.completion_percent(),
        stats,
    };
    render_mode(session.output, &report, write_text, write_pretty)
}

fn write_text(report: &StatsReport, w: &mut dyn Write) -> io::Result<()> {
    let stats = &report.stats;
    writeln!(w, "total\t{}", stats.total)?;
    writeln!(w, "open\t{}", stats.open)?;
    writeln!(w, "critical\t{}", stats.critical)?;
    for (status, count) in &stats.by_status {
        writeln!(w, "{status}\t{count}")?;
    }
    writeln!(w, "completion\t{}%", report.completion_percent)
}

fn write_pretty(report: &StatsReport, w: &mut dyn Write) -> io::Result<()> {
    let stats = &report.stats;
    pretty_section(w, "Dashboard")?;
    pretty_kv(w, "Project", &report.project)?;
    pretty_kv(w, "Total", stats.total.to_string())?;
    pretty_kv(w, "Open", stats.open.to_string())?;
    pretty_kv(w, "Critical", stats.critical.to_string())?;
    pretty_kv(w, "Completion", format!("{}%", report.completion_percent))?;
    writeln!(w)?;
    pretty_section(w, "By status")?;
    for (status, count) in &stats.by_status {
        pretty_kv(w, status.title(), count.to_string())?;
    }
    if !stats.recent.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Recently updated")?;
        for issue in &stats.recent {
            issue_line(w, issue)?;
        }
    }
    if !stats.high_priority_open.is_empty() {
        writeln!(w)?;
        pretty_section(w, "High priority")?;
        for issue in &stats.high_priority_open {
            issue_line(w, issue)?;
        }
    }
    Ok(())
}
