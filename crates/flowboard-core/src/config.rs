use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::query::{SortDirection, SortKey, SortSpec};
use crate::store::DEFAULT_REPORTER;

/// Directory holding project state, relative to the project root.
pub const PROJECT_DIR: &str = ".flowboard";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_reporter")]
    pub default_reporter: String,
    /// Database file, relative to the project root unless absolute.
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            default_reporter: default_reporter(),
            database: default_database(),
        }
    }
}

/// Default ordering for `list`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

impl ViewConfig {
    #[must_use]
    pub const fn sort_spec(self) -> SortSpec {
        SortSpec::new(self.sort, self.direction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_recent_days")]
    pub recent_days: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_days: default_recent_days(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Name used as comment author and reporter.
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

impl EffectiveConfig {
    /// Who new issues and comments are attributed to.
    #[must_use]
    pub fn author(&self) -> &str {
        self.user
            .user
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.project.workspace.default_reporter)
    }

    /// Absolute database path for a project rooted at `project_root`.
    #[must_use]
    pub fn database_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.project.workspace.database)
    }
}

/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("flowboard/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write a default project config unless one exists. Returns its path.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_default_project_config(project_root: &Path) -> Result<PathBuf> {
    let dir = project_root.join(PROJECT_DIR);
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join("config.toml");
    if !path.exists() {
        let content = toml::to_string_pretty(&ProjectConfig::default())
            .context("Failed to render default config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(path)
}

/// Walk up from `start` to the nearest directory containing `.flowboard/`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// # Errors
///
/// Returns an error if either config file is present but invalid.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(cli_json: bool, user_output: Option<String>, env_format: Option<String>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_reporter() -> String {
    DEFAULT_REPORTER.to_string()
}

fn default_database() -> PathBuf {
    PathBuf::from(PROJECT_DIR).join("issues.db")
}

const fn default_recent_days() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.workspace.default_reporter, "Current User");
        assert_eq!(cfg.workspace.database, PathBuf::from(".flowboard/issues.db"));
        assert_eq!(cfg.view.sort_spec(), SortSpec::default());
        assert_eq!(cfg.dashboard.recent_days, 3);
    }

    #[test]
    fn partial_project_config_fills_defaults() {
        let cfg: ProjectConfig = toml::from_str(
            r#"
[view]
sort = "priority"

[dashboard]
recent_days = 7
"#,
        )
        .expect("parse");
        assert_eq!(cfg.view.sort, SortKey::Priority);
        assert_eq!(cfg.view.direction, SortDirection::Desc);
        assert_eq!(cfg.dashboard.recent_days, 7);
        assert_eq!(cfg.workspace, WorkspaceConfig::default());
    }

    #[test]
    fn invalid_project_config_names_the_file() {
        let root = tempfile::tempdir().expect("temp dir");
        let dir = root.path().join(PROJECT_DIR);
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(dir.join("config.toml"), "[view]\nsort = 42\n").expect("write");
        let err = load_project_config(root.path()).expect_err("must fail");
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn default_config_is_written_once_and_found() {
        let root = tempfile::tempdir().expect("temp dir");
        let path = write_default_project_config(root.path()).expect("write");
        std::fs::write(&path, "[dashboard]\nrecent_days = 9\n").expect("overwrite");
        write_default_project_config(root.path()).expect("second write");
        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.dashboard.recent_days, 9);

        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("nested");
        assert_eq!(find_project_root(&nested).as_deref(), Some(root.path()));
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()));
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_user_config_and_aliases_normalize() {
        assert_eq!(
            resolve_output(false, Some("table".to_string()), Some("human".to_string())),
            "pretty"
        );
        assert_eq!(
            resolve_output(false, Some("human".to_string()), Some("table".to_string())),
            "text"
        );
        assert_eq!(resolve_output(false, Some("json".to_string()), None), "json");
    }

    #[test]
    fn author_prefers_user_name() {
        let mut cfg = EffectiveConfig {
            project: ProjectConfig::default(),
            user: UserConfig::default(),
            resolved_output: "text".into(),
        };
        assert_eq!(cfg.author(), "Current User");
        cfg.user.user = Some("Sarah Chen".into());
        assert_eq!(cfg.author(), "Sarah Chen");
    }
}
