use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::model::{Issue, IssueType, ParseEnumError, Priority, Status};

/// The four filterable issue fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCategory {
    Status,
    Priority,
    Type,
    Assignee,
}

impl FilterCategory {
    pub const ALL: [Self; 4] = [Self::Status, Self::Priority, Self::Type, Self::Assignee];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
            Self::Type => "type",
            Self::Assignee => "assignee",
        }
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(Self::Status),
            "priority" => Ok(Self::Priority),
            "type" | "kind" => Ok(Self::Type),
            "assignee" => Ok(Self::Assignee),
            _ => Err(ParseEnumError {
                expected: "filter category",
                got: s.to_string(),
            }),
        }
    }
}

/// Accepted values per category.
///
/// An empty category places no restriction. Categories combine with AND;
/// values within one category combine with OR. Unassigned issues match the
/// assignee value `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
    pub status: BTreeSet<Status>,
    pub priority: BTreeSet<Priority>,
    #[serde(rename = "type")]
    pub issue_type: BTreeSet<IssueType>,
    pub assignee: BTreeSet<String>,
}

impl FilterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_status<I: IntoIterator<Item = Status>>(mut self, values: I) -> Self {
        self.status.extend(values);
        self
    }

    #[must_use]
    pub fn with_priority<I: IntoIterator<Item = Priority>>(mut self, values: I) -> Self {
        self.priority.extend(values);
        self
    }

    #[must_use]
    pub fn with_type<I: IntoIterator<Item = IssueType>>(mut self, values: I) -> Self {
        self.issue_type.extend(values);
        self
    }

    #[must_use]
    pub fn with_assignee<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignee.extend(values.into_iter().map(Into::into));
        self
    }

    /// True when no category restricts anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
            && self.priority.is_empty()
            && self.issue_type.is_empty()
            && self.assignee.is_empty()
    }

    /// Number of selected values across all categories.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.status.len() + self.priority.len() + self.issue_type.len() + self.assignee.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether `issue` passes every non-empty category.
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        (self.status.is_empty() || self.status.contains(&issue.status))
            && (self.priority.is_empty() || self.priority.contains(&issue.priority))
            && (self.issue_type.is_empty() || self.issue_type.contains(&issue.issue_type))
            && (self.assignee.is_empty() || self.assignee.contains(issue.assignee_name()))
    }

    /// Select `value` in `category` if absent, deselect it if present.
    /// Returns whether the value is selected afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ParseEnumError`] when `value` is not valid for `category`.
    pub fn toggle(&mut self, category: FilterCategory, value: &str) -> Result<bool, ParseEnumError> {
        Ok(match category {
            FilterCategory::Status => toggle_in(&mut self.status, value.parse()?),
            FilterCategory::Priority => toggle_in(&mut self.priority, value.parse()?),
            FilterCategory::Type => toggle_in(&mut self.issue_type, value.parse()?),
            FilterCategory::Assignee => toggle_in(&mut self.assignee, value.trim().to_string()),
        })
    }

    /// Add values from `category=v1,v2` text (e.g. `status=todo,done`).
    ///
    /// # Errors
    ///
    /// Returns [`ParseEnumError`] for an unknown category, a missing `=`, or
    /// an invalid value.
    pub fn parse_pair(&mut self, pair: &str) -> Result<(), ParseEnumError> {
        let (category, values) = pair.split_once('=').ok_or_else(|| ParseEnumError {
            expected: "category=value[,value]",
            got: pair.to_string(),
        })?;
        let category: FilterCategory = category.parse()?;
        for value in values.split(',').map(str::trim).filter(|v| !v.is_empty()) {
            self.insert(category, value)?;
        }
        Ok(())
    }

    /// Add one value to `category`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseEnumError`] when `value` is not valid for `category`.
    pub fn insert(&mut self, category: FilterCategory, value: &str) -> Result<(), ParseEnumError> {
        match category {
            FilterCategory::Status => {
                self.status.insert(value.parse()?);
            }
            FilterCategory::Priority => {
                self.priority.insert(value.parse()?);
            }
            FilterCategory::Type => {
                self.issue_type.insert(value.parse()?);
            }
            FilterCategory::Assignee => {
                self.assignee.insert(value.trim().to_string());
            }
        }
        Ok(())
    }
}

fn toggle_in<T: Ord>(set: &mut BTreeSet<T>, value: T) -> bool {
    if set.remove(&value) {
        false
    } else {
        set.insert(value);
        true
    }
}

/// Keep the issues that pass `filters`, preserving input order.
///
/// An empty filter set returns the input unchanged.
#[must_use]
pub fn apply_filters(issues: &[Issue], filters: &FilterSet) -> Vec<Issue> {
    if filters.is_empty() {
        return issues.to_vec();
    }
    issues
        .iter()
        .filter(|issue| filters.matches(issue))
        .cloned()
        .collect()
}
