//! SQLite schema for the durable issue backend.
//!
//! - `issues` holds one row per issue. Comments live in the `comments`
//!   column as a single encoded blob (see [`crate::codec`]).
//! - `issue_labels` keeps labels in their original order via `position`.
//! - `board_meta` records the schema version and the highest id ever issued,
//!   so ids of deleted issues are never handed out again.

/// Migration v1: tables and metadata row.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS issues (
    issue_id INTEGER PRIMARY KEY CHECK (issue_id > 0),
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    issue_type TEXT NOT NULL CHECK (issue_type IN ('bug', 'feature', 'task')),
    priority TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high', 'critical')),
    status TEXT NOT NULL
        CHECK (status IN ('backlog', 'todo', 'in-progress', 'review', 'done')),
    assignee TEXT,
    reporter TEXT NOT NULL,
    comments TEXT NOT NULL DEFAULT '',
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS issue_labels (
    issue_id INTEGER NOT NULL REFERENCES issues(issue_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    label TEXT NOT NULL CHECK (length(trim(label)) > 0),
    PRIMARY KEY (issue_id, position)
);

CREATE TABLE IF NOT EXISTS board_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_issue_id INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO board_meta (id, schema_version, last_issue_id) VALUES (1, 1, 0);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_issues_status_priority
    ON issues(status, priority);

CREATE INDEX IF NOT EXISTS idx_issues_updated
    ON issues(updated_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_issues_assignee
    ON issues(assignee);

CREATE INDEX IF NOT EXISTS idx_issue_labels_label
    ON issue_labels(label, issue_id);
";

/// Indexes every fully migrated database must have.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_issues_status_priority",
    "idx_issues_updated",
    "idx_issues_assignee",
    "idx_issue_labels_label",
];
