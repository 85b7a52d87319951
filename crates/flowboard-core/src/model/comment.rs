use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque comment token, unique within one issue.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    /// The `n`-th comment id of an issue (`c1`, `c2`, ...).
    #[must_use]
    pub fn sequential(n: usize) -> Self {
        Self(format!("c{n}"))
    }

    /// Next sequential id that does not collide with `existing`.
    #[must_use]
    pub fn next_after(existing: &[Comment]) -> Self {
        let highest = existing
            .iter()
            .filter_map(|comment| comment.id.sequence())
            .max()
            .unwrap_or(0);
        Self::sequential(highest.max(existing.len()) + 1)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sequence(&self) -> Option<usize> {
        self.0.strip_prefix('c')?.parse().ok()
    }
}

impl From<&str> for CommentId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A note attached to an issue. Comments are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
