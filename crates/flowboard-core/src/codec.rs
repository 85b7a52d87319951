//! Comment blob codec.
//!
//! An issue's comments are persisted as one text blob, one line per comment:
//!
//! ```text
//! Sarah Chen: Looks good
//! David Kim: Needs a test for the empty case
//! ```
//!
//! The format is lossy:
//!
//! - comment ids and timestamps are not stored; decoding assigns fresh
//!   sequential ids (`c1`, `c2`, ...) and the decode-time timestamp;
//! - nothing is escaped, so a newline inside `content` splits that comment
//!   into several on decode;
//! - a line without a colon decodes with the author [`UNKNOWN_AUTHOR`].
//!
//! Decoding never fails. A stored blob is unstructured text and must always
//! render.

use chrono::{DateTime, Utc};

use crate::model::{Comment, CommentId};

/// Author assigned to lines that carry no `author:` prefix.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Encode comments as `"{author}: {content}\n"` lines, in order.
#[must_use]
pub fn encode_comments(comments: &[Comment]) -> String {
    let mut blob = String::new();
    for comment in comments {
        blob.push_str(&comment.author);
        blob.push_str(": ");
        blob.push_str(&comment.content);
        blob.push('\n');
    }
    blob
}

/// Decode a blob into comments, best effort.
///
/// Each non-empty line becomes one comment. The first colon separates the
/// author (kept as written) from the content (trimmed).
#[must_use]
pub fn decode_comments(blob: &str, decoded_at: DateTime<Utc>) -> Vec<Comment> {
    blob.lines()
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            let (author, content) = match line.split_once(':') {
                Some((author, content)) => (author.to_string(), content.trim().to_string()),
                None => (UNKNOWN_AUTHOR.to_string(), line.to_string()),
            };
            Comment {
                id: CommentId::sequential(index + 1),
                author,
                content,
                created_at: decoded_at,
            }
        })
        .collect()
}
