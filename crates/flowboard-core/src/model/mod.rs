//! Issue domain types.

pub mod comment;
pub mod issue;
pub mod patch;

pub use comment::{Comment, CommentId};
pub use issue::{Issue, IssueId, IssueType, ParseEnumError, Priority, Status};
pub use patch::{Field, FieldValue, IssueDraft, IssuePatch};
