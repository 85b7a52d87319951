//! `fb init`: create `.flowboard/` with a default config and an empty database.

use crate::output::{OutputMode, fail_setup, pretty_kv, render_mode};
use anyhow::Context;
use clap::Args;
use flowboard_core::config::{PROJECT_DIR, resolve_config, write_default_project_config};
use flowboard_core::db::SqliteGateway;
use flowboard_core::error::ErrorCode;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Seed the board with a handful of example issues.
    #[arg(long)]
    pub demo: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    project_dir: String,
    config: String,
    database: String,
    seeded: usize,
}

pub fn run_init(args: &InitArgs, cli_json: bool, project_root: &Path) -> anyhow::Result<()> {
    let config_path = write_default_project_config(project_root)?;
    let early_mode = if cli_json { OutputMode::Json } else { OutputMode::Text };
    let config = resolve_config(project_root, cli_json)
        .map_err(|err| fail_setup(early_mode, ErrorCode::ConfigParseError, err))?;
    let output = OutputMode::from_resolved(&config.resolved_output);
    let db_path = config.database_path(project_root);
    let mut gateway = SqliteGateway::open(&db_path)
        .with_context(|| format!("Failed to create {}", db_path.display()))
        .map_err(|err| fail_setup(output, ErrorCode::StorageOpenFailed, err))?;

    let seeded = if args.demo {
        let issues = super::create::demo_issues(config.author());
        gateway.import(&issues)?
    } else {
        0
    };
    info!(path = %db_path.display(), seeded, "initialized project");

    let report = InitReport {
        project_dir: project_root.join(PROJECT_DIR).display().to_string(),
        config: config_path.display().to_string(),
        database: db_path.display().to_string(),
        seeded,
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "{}\t{}", r.project_dir, r.seeded),
        |r, w| {
            writeln!(w, "Initialized flowboard project")?;
            pretty_kv(w, "Config", &r.config)?;
            pretty_kv(w, "Database", &r.database)?;
            if r.seeded > 0 {
                pretty_kv(w, "Seeded", format!("{} issues", r.seeded))?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowboard_core::config::find_project_root;

    #[test]
    fn init_is_idempotent_and_discoverable() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs { demo: false };
        run_init(&args, true, dir.path()).unwrap();
        run_init(&args, true, dir.path()).unwrap();
        assert_eq!(find_project_root(dir.path()).as_deref(), Some(dir.path()));
        assert!(dir.path().join(".flowboard/issues.db").exists());
    }
}
