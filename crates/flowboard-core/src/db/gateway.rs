//! [`PersistenceGateway`] backed by SQLite.
//!
//! Timestamps are stored as microseconds since the Unix epoch. Comments are
//! stored as one codec blob per issue, so reading an issue back yields fresh
//! comment ids and the read time as each comment's timestamp.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::codec::{decode_comments, encode_comments};
use crate::error::GatewayError;
use crate::gateway::PersistenceGateway;
use crate::model::{Issue, IssueDraft, IssueId, IssuePatch, ParseEnumError};
use crate::query::FilterSet;
use crate::store::DEFAULT_REPORTER;

const ISSUE_COLUMNS: &str = "i.issue_id, i.title, i.description, i.issue_type, i.priority, \
     i.status, i.assignee, i.reporter, i.comments, i.created_at_us, i.updated_at_us";

/// Durable issue backend over one SQLite connection.
pub struct SqliteGateway {
    conn: Connection,
    clock: Box<dyn Clock>,
    default_reporter: String,
}

impl std::fmt::Debug for SqliteGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteGateway")
            .field("path", &self.conn.path())
            .field("default_reporter", &self.default_reporter)
            .finish_non_exhaustive()
    }
}

impl SqliteGateway {
    /// Wrap an already migrated connection.
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            clock: Box::new(SystemClock::new()),
            default_reporter: DEFAULT_REPORTER.to_string(),
        }
    }

    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(super::open_database(path)?))
    }

    /// Throwaway database, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot create the database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(super::open_in_memory()?))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_default_reporter(mut self, reporter: impl Into<String>) -> Self {
        self.default_reporter = reporter.into();
        self
    }

    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Highest id ever issued by this database, including deleted issues.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] if the query fails.
    pub fn last_issue_id(&self) -> Result<IssueId, GatewayError> {
        Ok(IssueId(last_issue_id(&self.conn)?))
    }

    /// Insert or overwrite issues as given, keeping their ids and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] if any write fails; nothing is
    /// imported in that case.
    pub fn import(&mut self, issues: &[Issue]) -> Result<usize, GatewayError> {
        let tx = self.conn.transaction()?;
        for issue in issues {
            upsert_issue(&tx, issue)?;
        }
        tx.commit()?;
        debug!(count = issues.len(), "imported issues");
        Ok(issues.len())
    }

    fn query_issues(
        &self,
        where_clause: &str,
        values: &[String],
    ) -> Result<Vec<Issue>, GatewayError> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues i{where_clause} ORDER BY i.issue_id");
        let decoded_at = self.clock.now();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            row_to_issue(row, decoded_at)
        })?;
        let mut issues = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        for issue in &mut issues {
            issue.labels = load_labels(&self.conn, issue.id)?;
        }
        Ok(issues)
    }
}

impl PersistenceGateway for SqliteGateway {
    fn fetch_all(&self) -> Result<Vec<Issue>, GatewayError> {
        self.query_issues("", &[])
    }

    fn fetch_by_id(&self, id: IssueId) -> Result<Option<Issue>, GatewayError> {
        Ok(fetch_one(&self.conn, id, self.clock.now())?)
    }

    fn create(&mut self, draft: &IssueDraft) -> Result<Issue, GatewayError> {
        let now = self.clock.now();
        let tx = self.conn.transaction()?;
        let max_row: i64 =
            tx.query_row("SELECT COALESCE(MAX(issue_id), 0) FROM issues", [], |row| {
                row.get(0)
            })?;
        let next = last_issue_id(&tx)?.max(to_u64(0, max_row)?) + 1;
        let issue = draft
            .clone()
            .into_issue(IssueId(next), now, &self.default_reporter);
        upsert_issue(&tx, &issue)?;
        tx.commit()?;
        debug!(issue_id = %issue.id, "inserted issue row");
        Ok(issue)
    }

    fn update(&mut self, id: IssueId, patch: &IssuePatch) -> Result<Issue, GatewayError> {
        let now = self.clock.now();
        let tx = self.conn.transaction()?;
        let mut issue = fetch_one(&tx, id, now)?.ok_or(GatewayError::NotFound(id))?;
        for value in patch.clone().into_values() {
            value.write(&mut issue);
        }
        issue.updated_at = now;
        upsert_issue(&tx, &issue)?;
        tx.commit()?;
        debug!(issue_id = %id, "updated issue row");
        Ok(issue)
    }

    fn delete(&mut self, id: IssueId) -> Result<bool, GatewayError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM issue_labels WHERE issue_id = ?1", [to_sql_id(id)?])?;
        let removed = tx.execute("DELETE FROM issues WHERE issue_id = ?1", [to_sql_id(id)?])?;
        tx.commit()?;
        debug!(issue_id = %id, removed, "deleted issue row");
        Ok(removed > 0)
    }

    fn search(&self, query: &str) -> Result<Vec<Issue>, GatewayError> {
        if query.trim().is_empty() {
            return self.fetch_all();
        }
        // SQLite LIKE folds ASCII only; `\` escapes the wildcards.
        let pattern = format!("%{}%", escape_like(query));
        let where_clause = " WHERE i.title LIKE ?1 ESCAPE '\\' \
             OR i.description LIKE ?1 ESCAPE '\\' \
             OR COALESCE(i.assignee, '') LIKE ?1 ESCAPE '\\' \
             OR i.reporter LIKE ?1 ESCAPE '\\' \
             OR EXISTS (SELECT 1 FROM issue_labels l \
                        WHERE l.issue_id = i.issue_id AND l.label LIKE ?1 ESCAPE '\\')";
        self.query_issues(where_clause, &[pattern])
    }

    fn filter(&self, criteria: &FilterSet) -> Result<Vec<Issue>, GatewayError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        let mut push_in = |column: &str, selected: Vec<String>| {
            if selected.is_empty() {
                return;
            }
            let mut placeholders = String::new();
            for value in selected {
                values.push(value);
                if !placeholders.is_empty() {
                    placeholders.push_str(", ");
                }
                let _ = write!(placeholders, "?{}", values.len());
            }
            conditions.push(format!("{column} IN ({placeholders})"));
        };

        push_in("i.status", criteria.status.iter().map(|s| s.as_str().to_string()).collect());
        push_in(
            "i.priority",
            criteria.priority.iter().map(|p| p.as_str().to_string()).collect(),
        );
        push_in(
            "i.issue_type",
            criteria.issue_type.iter().map(|t| t.as_str().to_string()).collect(),
        );
        push_in(
            "COALESCE(i.assignee, '')",
            criteria.assignee.iter().cloned().collect(),
        );

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        self.query_issues(&where_clause, &values)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn fetch_one(
    conn: &Connection,
    id: IssueId,
    decoded_at: DateTime<Utc>,
) -> rusqlite::Result<Option<Issue>> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues i WHERE i.issue_id = ?1");
    let issue = conn
        .query_row(&sql, [to_sql_id(id)?], |row| row_to_issue(row, decoded_at))
        .optional()?;
    match issue {
        Some(mut issue) => {
            issue.labels = load_labels(conn, id)?;
            Ok(Some(issue))
        }
        None => Ok(None),
    }
}

fn row_to_issue(row: &Row<'_>, decoded_at: DateTime<Utc>) -> rusqlite::Result<Issue> {
    let blob: String = row.get(8)?;
    Ok(Issue {
        id: IssueId(to_u64(0, row.get(0)?)?),
        title: row.get(1)?,
        description: row.get(2)?,
        issue_type: parse_column(row, 3)?,
        priority: parse_column(row, 4)?,
        status: parse_column(row, 5)?,
        assignee: row.get(6)?,
        reporter: row.get(7)?,
        labels: Vec::new(),
        comments: decode_comments(&blob, decoded_at),
        created_at: from_micros(9, row.get(9)?)?,
        updated_at: from_micros(10, row.get(10)?)?,
    })
}

fn load_labels(conn: &Connection, id: IssueId) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn
        .prepare_cached("SELECT label FROM issue_labels WHERE issue_id = ?1 ORDER BY position")?;
    let rows = stmt.query_map([to_sql_id(id)?], |row| row.get(0))?;
    rows.collect()
}

fn upsert_issue(conn: &Connection, issue: &Issue) -> rusqlite::Result<()> {
    let id = to_sql_id(issue.id)?;
    conn.execute(
        "INSERT INTO issues (issue_id, title, description, issue_type, priority, status,
                             assignee, reporter, comments, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(issue_id) DO UPDATE SET
             title = excluded.title,
             description = excluded.description,
             issue_type = excluded.issue_type,
             priority = excluded.priority,
             status = excluded.status,
             assignee = excluded.assignee,
             reporter = excluded.reporter,
             comments = excluded.comments,
             created_at_us = excluded.created_at_us,
             updated_at_us = excluded.updated_at_us",
        params![
            id,
            issue.title,
            issue.description,
            issue.issue_type.as_str(),
            issue.priority.as_str(),
            issue.status.as_str(),
            issue.assignee,
            issue.reporter,
            encode_comments(&issue.comments),
            issue.created_at.timestamp_micros(),
            issue.updated_at.timestamp_micros(),
        ],
    )?;

    conn.execute("DELETE FROM issue_labels WHERE issue_id = ?1", [id])?;
    let mut insert = conn.prepare_cached(
        "INSERT INTO issue_labels (issue_id, position, label) VALUES (?1, ?2, ?3)",
    )?;
    for (position, label) in issue.labels.iter().enumerate() {
        let position = i64::try_from(position).unwrap_or(i64::MAX);
        insert.execute(params![id, position, label])?;
    }

    conn.execute(
        "UPDATE board_meta SET last_issue_id = MAX(last_issue_id, ?1) WHERE id = 1",
        [id],
    )?;
    Ok(())
}

fn last_issue_id(conn: &Connection) -> rusqlite::Result<u64> {
    let last: i64 = conn.query_row(
        "SELECT last_issue_id FROM board_meta WHERE id = 1",
        [],
        |row| row.get(0),
    )?;
    to_u64(0, last)
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn from_micros(idx: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {micros}").into(),
        )
    })
}

fn to_u64(idx: usize, value: i64) -> rusqlite::Result<u64> {
    u64::try_from(value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err)))
}

fn to_sql_id(id: IssueId) -> rusqlite::Result<i64> {
    i64::try_from(id.get()).map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))
}

/// Escape `\`, `%` and `_` so a query matches literally under `ESCAPE '\'`.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
