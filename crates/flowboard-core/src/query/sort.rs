use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::model::{Issue, ParseEnumError};

/// Field an issue listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    UpdatedAt,
    CreatedAt,
    Title,
    Priority,
    Status,
}

impl SortKey {
    pub const ALL: [Self; 5] = [
        Self::UpdatedAt,
        Self::CreatedAt,
        Self::Title,
        Self::Priority,
        Self::Status,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpdatedAt => "updatedAt",
            Self::CreatedAt => "createdAt",
            Self::Title => "title",
            Self::Priority => "priority",
            Self::Status => "status",
        }
    }

    fn compare(self, a: &Issue, b: &Issue) -> Ordering {
        match self {
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::Title => a.title.cmp(&b.title),
            Self::Priority => a.priority.rank().cmp(&b.priority.rank()),
            Self::Status => a.status.rank().cmp(&b.status.rank()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "updatedat" | "updated" | "recent" => Ok(Self::UpdatedAt),
            "createdat" | "created" | "newest" => Ok(Self::CreatedAt),
            "title" => Ok(Self::Title),
            "priority" => Ok(Self::Priority),
            "status" => Ok(Self::Status),
            _ => Err(ParseEnumError {
                expected: "sort key",
                got: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(ParseEnumError {
                expected: "sort direction",
                got: s.to_string(),
            }),
        }
    }
}

/// Sort key plus direction. Defaults to most recently updated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    #[must_use]
    pub const fn asc(key: SortKey) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    #[must_use]
    pub const fn desc(key: SortKey) -> Self {
        Self::new(key, SortDirection::Desc)
    }

    /// Compare two issues under this spec. Equal keys compare `Equal` in both
    /// directions, so a stable sort keeps their input order.
    #[must_use]
    pub fn compare(self, a: &Issue, b: &Issue) -> Ordering {
        let ordering = self.key.compare(a, b);
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.direction)
    }
}

/// Return a sorted copy of `issues`. The input is never reordered.
#[must_use]
pub fn sort_issues(issues: &[Issue], spec: SortSpec) -> Vec<Issue> {
    let mut sorted = issues.to_vec();
    sorted.sort_by(|a, b| spec.compare(a, b));
    sorted
}
