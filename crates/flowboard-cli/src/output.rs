//! Shared output layer for pretty/text/JSON parity across `fb` commands.
//!
//! The mode comes from [`flowboard_core::config::EffectiveConfig`]:
//! `--json` beats `FORMAT`, which beats the user config, which beats TTY
//! detection (pretty on a terminal, text when piped).

use flowboard_core::error::{CoreError, ErrorCode};
use flowboard_core::model::Issue;
use flowboard_core::query::Segment;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-optimized output (sections, aligned columns).
    Pretty,
    /// Tab-separated rows for agents and pipes.
    Text,
    Json,
}

impl OutputMode {
    /// Map a resolved config value onto a mode. Unknown values fall back to
    /// text.
    #[must_use]
    pub fn from_resolved(raw: &str) -> Self {
        match raw {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Text,
        }
    }

    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render with one renderer shared by pretty and text modes.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
    } else {
        human_fn(value, &mut out)?;
    }
    Ok(())
}

/// Column headers matching [`issue_row`].
pub const ISSUE_HEADERS: [&str; 6] = ["id", "status", "priority", "type", "assignee", "title"];

/// One tab-separated row per issue.
pub fn issue_row(w: &mut dyn Write, issue: &Issue) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}",
        issue.id,
        issue.status,
        issue.priority,
        issue.issue_type,
        issue.assignee.as_deref().unwrap_or("-"),
        issue.title
    )
}

/// Aligned single-line summary for pretty listings.
pub fn issue_line(w: &mut dyn Write, issue: &Issue) -> io::Result<()> {
    writeln!(
        w,
        "{:>5}  {:<12} {:<9} {:<8} {}",
        issue.id.to_string(),
        issue.status.title(),
        issue.priority.as_str(),
        issue.issue_type.as_str(),
        issue.title
    )
}

/// Write issues as a header plus rows (text) or aligned lines (pretty).
pub fn issue_table(w: &mut dyn Write, issues: &[Issue], pretty: bool) -> io::Result<()> {
    if issues.is_empty() {
        return writeln!(w, "No issues found");
    }
    if pretty {
        for issue in issues {
            issue_line(w, issue)?;
        }
    } else {
        writeln!(w, "{}", ISSUE_HEADERS.join("\t"))?;
        for issue in issues {
            issue_row(w, issue)?;
        }
    }
    Ok(())
}

/// Join highlight segments, wrapping matches in `open`/`close` markers.
#[must_use]
pub fn mark_segments(segments: &[Segment<'_>], open: &str, close: &str) -> String {
    let mut marked = String::new();
    for segment in segments {
        if segment.matched {
            marked.push_str(open);
            marked.push_str(segment.text);
            marked.push_str(close);
        } else {
            marked.push_str(segment.text);
        }
    }
    marked
}

/// A structured error with optional hint and code.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable code such as `E2001`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl From<&CoreError> for CliError {
    fn from(err: &CoreError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.hint().map(str::to_string),
            error_code: Some(err.code().code().to_string()),
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    if mode.is_json() {
        let wrapper = serde_json::json!({ "error": error });
        serde_json::to_writer_pretty(&mut out, &wrapper)?;
        writeln!(out)?;
    } else {
        writeln!(out, "error: {}", error.message)?;
        if let Some(ref suggestion) = error.suggestion {
            writeln!(out, "  suggestion: {suggestion}")?;
        }
    }
    Ok(())
}

impl CliError {
    /// Error for a setup failure that has a code but no [`CoreError`].
    pub fn coded(code: ErrorCode, detail: &dyn fmt::Display) -> Self {
        Self {
            message: format!("{}: {detail}", code.message()),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

/// Report a setup failure under `code` and pass the error on.
pub fn fail_setup(mode: OutputMode, code: ErrorCode, err: anyhow::Error) -> anyhow::Error {
    if let Err(render_err) = render_error(mode, &CliError::coded(code, &format!("{err:#}"))) {
        return render_err;
    }
    err
}

/// Report a core failure on stderr and turn it into the command's error.
pub fn fail(mode: OutputMode, err: &CoreError) -> anyhow::Error {
    if let Err(render_err) = render_error(mode, &CliError::from(err)) {
        return render_err;
    }
    anyhow::anyhow!("{err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowboard_core::model::IssueId;
    use flowboard_core::query::highlight;

    #[test]
    fn resolved_values_map_to_modes() {
        assert_eq!(OutputMode::from_resolved("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_resolved("pretty"), OutputMode::Pretty);
        assert_eq!(OutputMode::from_resolved("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_resolved("???"), OutputMode::Text);
    }

    #[test]
    fn setup_errors_carry_code_and_detail() {
        let cli = CliError::coded(ErrorCode::ConfigParseError, &"bad key at line 2");
        assert_eq!(cli.message, "Config file parse error: bad key at line 2");
        assert_eq!(cli.error_code.as_deref(), Some("E1002"));
        assert!(cli.suggestion.is_some());
    }

    #[test]
    fn core_errors_carry_code_and_hint() {
        let err = CoreError::NotFound { id: IssueId(4) };
        let cli = CliError::from(&err);
        assert_eq!(cli.message, "issue #4 not found");
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert!(cli.suggestion.is_none());

        let err = CoreError::Validation {
            field: "title",
            reason: "must not be empty",
        };
        assert!(CliError::from(&err).suggestion.is_some());
    }

    #[test]
    fn marks_wrap_matched_segments() {
        let segments = highlight("Login fails on login page", "LOGIN");
        assert_eq!(
            mark_segments(&segments, "[", "]"),
            "[Login] fails on [login] page"
        );
    }

    #[test]
    fn empty_table_says_so() {
        let mut buf = Vec::new();
        issue_table(&mut buf, &[], false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "No issues found\n");
    }
}
