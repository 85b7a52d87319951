//! Free-text issue search and match highlighting.
//!
//! Matching is a case-insensitive literal substring test. The query is never
//! interpreted as a pattern, so `c++`, `a.b`, or `(wip)` match themselves.
//! Case folding is per character (`char::to_lowercase`) for both the filter
//! and the span locator, so an issue is returned exactly when its fields
//! contain a locatable span.

use serde::Serialize;

use crate::model::Issue;

/// Byte range `[start, end)` of one match inside the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// A run of text that either matched the query or did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

fn fold(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}

/// Whether any searchable field of `issue` contains the already-folded needle.
fn issue_contains(issue: &Issue, needle: &str) -> bool {
    let hit = |text: &str| fold(text).contains(needle);
    hit(&issue.title)
        || hit(&issue.description)
        || issue.labels.iter().any(|label| hit(label))
        || hit(issue.assignee_name())
        || hit(&issue.reporter)
}

/// Whether `issue` matches `query` in title, description, any label,
/// assignee, or reporter. A blank query matches everything.
#[must_use]
pub fn matches_query(issue: &Issue, query: &str) -> bool {
    is_blank(query) || issue_contains(issue, &fold(query))
}

/// Keep the issues matching `query`, preserving input order.
///
/// An empty or whitespace-only query returns the input unchanged.
#[must_use]
pub fn search_issues(issues: &[Issue], query: &str) -> Vec<Issue> {
    if is_blank(query) {
        return issues.to_vec();
    }
    let needle = fold(query);
    issues
        .iter()
        .filter(|issue| issue_contains(issue, &needle))
        .cloned()
        .collect()
}

/// Every non-overlapping occurrence of `query` in `text`, leftmost first,
/// compared case-insensitively. Spans are byte ranges on `char` boundaries
/// of `text`. An empty query yields no spans.
#[must_use]
pub fn locate_matches(text: &str, query: &str) -> Vec<MatchSpan> {
    let needle = fold(query);
    if needle.is_empty() {
        return Vec::new();
    }

    // Fold the text, remembering which source char each folded byte came from.
    let mut folded = String::with_capacity(text.len());
    let mut origin: Vec<(usize, usize)> = Vec::with_capacity(text.len());
    for (start, ch) in text.char_indices() {
        let end = start + ch.len_utf8();
        for lower in ch.to_lowercase() {
            folded.push(lower);
            origin.extend(std::iter::repeat_n((start, end), lower.len_utf8()));
        }
    }

    let mut spans: Vec<MatchSpan> = Vec::new();
    for (at, found) in folded.match_indices(needle.as_str()) {
        let start = origin[at].0;
        let end = origin[at + found.len() - 1].1;
        if spans.last().is_some_and(|prev| start < prev.end) {
            continue;
        }
        spans.push(MatchSpan { start, end });
    }
    spans
}

/// Split `text` into alternating unmatched/matched segments for display.
/// Concatenating the segment texts reproduces `text`.
#[must_use]
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for span in locate_matches(text, query) {
        if span.start > cursor {
            segments.push(Segment {
                text: &text[cursor..span.start],
                matched: false,
            });
        }
        segments.push(Segment {
            text: &text[span.start..span.end],
            matched: true,
        });
        cursor = span.end;
    }
    if cursor < text.len() {
        segments.push(Segment {
            text: &text[cursor..],
            matched: false,
        });
    }
    segments
}
