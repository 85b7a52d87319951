//! Subcommand handlers and the project session they share.

pub mod board;
pub mod comment;
pub mod create;
pub mod delete;
pub mod edit;
pub mod init;
pub mod list;
pub mod move_cmd;
pub mod priority;
pub mod search;
pub mod show;
pub mod stats;

use crate::output::{CliError, OutputMode, fail_setup, render_error};
use anyhow::Context;
use flowboard_core::Workspace;
use flowboard_core::config::{EffectiveConfig, find_project_root, resolve_config};
use flowboard_core::db::SqliteGateway;
use flowboard_core::error::ErrorCode;
use flowboard_core::model::ParseEnumError;
use flowboard_core::notify::TracingNotifier;
use flowboard_core::store::IssueStore;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// An opened project: config, output mode, and a loaded workspace.
pub struct Session {
    pub root: PathBuf,
    pub config: EffectiveConfig,
    pub output: OutputMode,
    pub workspace: Workspace<SqliteGateway>,
}

impl Session {
    /// Find the project enclosing `start`, open its database, and load every
    /// issue into the local store.
    ///
    /// # Errors
    ///
    /// Fails when no project is found, the config is invalid, or the
    /// database cannot be opened or read.
    pub fn open(start: &Path, cli_json: bool) -> anyhow::Result<Self> {
        let early_mode = if cli_json { OutputMode::Json } else { OutputMode::Text };
        let Some(root) = find_project_root(start) else {
            render_error(
                early_mode,
                &CliError::coded(ErrorCode::NotInitialized, &start.display()),
            )?;
            anyhow::bail!("no flowboard project at or above {}", start.display());
        };

        let config = resolve_config(&root, cli_json)
            .map_err(|err| fail_setup(early_mode, ErrorCode::ConfigParseError, err))?;
        let output = OutputMode::from_resolved(&config.resolved_output);
        let db_path = config.database_path(&root);
        debug!(path = %db_path.display(), "opening issue database");
        let gateway = SqliteGateway::open(&db_path)
            .with_context(|| format!("Failed to open {}", db_path.display()))
            .map_err(|err| fail_setup(output, ErrorCode::StorageOpenFailed, err))?
            .with_default_reporter(config.author());
        let store = IssueStore::new().with_default_reporter(config.author());
        let mut workspace = Workspace::new(store, gateway)
            .with_notifier(TracingNotifier)
            .with_author(config.author());
        if let Err(err) = workspace.load() {
            return Err(crate::output::fail(output, &err));
        }

        Ok(Self {
            root,
            config,
            output,
            workspace,
        })
    }
}

/// Clap value parser for any core enum with a `FromStr` impl.
pub fn parse_value<T>(raw: &str) -> Result<T, String>
where
    T: FromStr<Err = ParseEnumError>,
{
    raw.parse::<T>()
        .map_err(|err| format!("{err} ({})", err.code()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowboard_core::model::{IssueId, Status};

    #[test]
    fn parse_value_reports_bad_input() {
        assert_eq!(parse_value::<Status>("in-progress"), Ok(Status::InProgress));
        assert_eq!(parse_value::<IssueId>("#12"), Ok(IssueId(12)));
        assert_eq!(
            parse_value::<Status>("blocked"),
            Err("invalid status: 'blocked' (E2003)".to_string())
        );
    }

    #[test]
    fn open_outside_project_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Session::open(dir.path(), true).is_err());
    }
}
