//! Creation drafts, explicit partial updates, and single-field values.
//!
//! [`IssuePatch`] lists every editable field as an independent `Option`, so a
//! caller states exactly which fields change. `id` and `reporter` have no
//! patch field and therefore cannot be overwritten after creation.
//!
//! [`FieldValue`] is the unit the optimistic protocol records: a patch is
//! decomposed into one value per present field, and rollback replays the prior
//! value of each field independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::comment::Comment;
use super::issue::{Issue, IssueId, IssueType, Priority, Status, normalize_assignee, normalize_labels};
use crate::error::CoreError;

/// Input for issue creation. Absent fields take the store defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IssueDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub labels: Option<Vec<String>>,
}

impl IssueDraft {
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Edit-commit validation: the title must be present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when the title is missing or blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title(self.title.as_deref().unwrap_or(""))
    }

    /// Materialize the draft as issue `id`, created and updated at `now`.
    /// Absent fields take their defaults; a blank reporter becomes
    /// `default_reporter`.
    #[must_use]
    pub fn into_issue(self, id: IssueId, now: DateTime<Utc>, default_reporter: &str) -> Issue {
        Issue {
            id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            issue_type: self.issue_type.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            assignee: normalize_assignee(self.assignee),
            reporter: self
                .reporter
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| default_reporter.to_string()),
            labels: normalize_labels(self.labels.unwrap_or_default()),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Explicit partial update. `None` leaves a field unchanged.
///
/// `assignee` is doubly optional: `Some(None)` clears the assignee while
/// `None` leaves it as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IssuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl IssuePatch {
    #[must_use]
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clone().into_values().is_empty()
    }

    /// Edit-commit validation. Only fields present in the patch are checked.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when a present title is blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }

    /// Decompose into one [`FieldValue`] per present field, in a fixed order.
    #[must_use]
    pub fn into_values(self) -> Vec<FieldValue> {
        let mut values = Vec::new();
        if let Some(v) = self.title {
            values.push(FieldValue::Title(v));
        }
        if let Some(v) = self.description {
            values.push(FieldValue::Description(v));
        }
        if let Some(v) = self.issue_type {
            values.push(FieldValue::Type(v));
        }
        if let Some(v) = self.priority {
            values.push(FieldValue::Priority(v));
        }
        if let Some(v) = self.status {
            values.push(FieldValue::Status(v));
        }
        if let Some(v) = self.assignee {
            values.push(FieldValue::Assignee(v));
        }
        if let Some(v) = self.labels {
            values.push(FieldValue::Labels(v));
        }
        if let Some(v) = self.comments {
            values.push(FieldValue::Comments(v));
        }
        values
    }

    /// Rebuild a patch from field values. Later values win on duplicates.
    #[must_use]
    pub fn from_values<I: IntoIterator<Item = FieldValue>>(values: I) -> Self {
        let mut patch = Self::default();
        for value in values {
            match value {
                FieldValue::Title(v) => patch.title = Some(v),
                FieldValue::Description(v) => patch.description = Some(v),
                FieldValue::Type(v) => patch.issue_type = Some(v),
                FieldValue::Priority(v) => patch.priority = Some(v),
                FieldValue::Status(v) => patch.status = Some(v),
                FieldValue::Assignee(v) => patch.assignee = Some(v),
                FieldValue::Labels(v) => patch.labels = Some(v),
                FieldValue::Comments(v) => patch.comments = Some(v),
            }
        }
        patch
    }
}

/// Editable issue fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Description,
    Type,
    Priority,
    Status,
    Assignee,
    Labels,
    Comments,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Type => "type",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::Assignee => "assignee",
            Self::Labels => "labels",
            Self::Comments => "comments",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a single editable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Title(String),
    Description(String),
    Type(IssueType),
    Priority(Priority),
    Status(Status),
    Assignee(Option<String>),
    Labels(Vec<String>),
    Comments(Vec<Comment>),
}

impl FieldValue {
    #[must_use]
    pub const fn field(&self) -> Field {
        match self {
            Self::Title(_) => Field::Title,
            Self::Description(_) => Field::Description,
            Self::Type(_) => Field::Type,
            Self::Priority(_) => Field::Priority,
            Self::Status(_) => Field::Status,
            Self::Assignee(_) => Field::Assignee,
            Self::Labels(_) => Field::Labels,
            Self::Comments(_) => Field::Comments,
        }
    }

    /// Read the current value of `field` from `issue`.
    #[must_use]
    pub fn read(issue: &Issue, field: Field) -> Self {
        match field {
            Field::Title => Self::Title(issue.title.clone()),
            Field::Description => Self::Description(issue.description.clone()),
            Field::Type => Self::Type(issue.issue_type),
            Field::Priority => Self::Priority(issue.priority),
            Field::Status => Self::Status(issue.status),
            Field::Assignee => Self::Assignee(issue.assignee.clone()),
            Field::Labels => Self::Labels(issue.labels.clone()),
            Field::Comments => Self::Comments(issue.comments.clone()),
        }
    }

    /// Whether `issue` currently holds exactly this value.
    #[must_use]
    pub fn is_current(&self, issue: &Issue) -> bool {
        Self::read(issue, self.field()) == *self
    }

    /// Write this value into `issue`, normalizing labels and assignee.
    /// Does not touch `updated_at`.
    pub fn write(self, issue: &mut Issue) {
        match self {
            Self::Title(v) => issue.title = v,
            Self::Description(v) => issue.description = v,
            Self::Type(v) => issue.issue_type = v,
            Self::Priority(v) => issue.priority = v,
            Self::Status(v) => issue.status = v,
            Self::Assignee(v) => issue.assignee = normalize_assignee(v),
            Self::Labels(v) => issue.labels = normalize_labels(v),
            Self::Comments(v) => issue.comments = v,
        }
    }
}

fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation {
            field: "title",
            reason: "must not be empty",
        });
    }
    Ok(())
}
