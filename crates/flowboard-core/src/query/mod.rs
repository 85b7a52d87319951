//! Derived issue views: filter, search, sort, and dashboard figures.
//!
//! Every function here is pure over its inputs. Views are re-derived from a
//! store snapshot whenever the filter, search text, or sort changes; nothing
//! is cached between calls.

pub mod filter;
pub mod search;
pub mod sort;
pub mod stats;

use serde::{Deserialize, Serialize};

use crate::model::Issue;

pub use filter::{FilterCategory, FilterSet, apply_filters};
pub use search::{MatchSpan, Segment, highlight, locate_matches, matches_query, search_issues};
pub use sort::{SortDirection, SortKey, SortSpec, sort_issues};
pub use stats::DashboardStats;

/// Everything that shapes a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewQuery {
    pub filters: FilterSet,
    pub search: String,
    pub sort: SortSpec,
}

impl ViewQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filtered(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn searching(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    #[must_use]
    pub const fn sorted(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    /// Filter, then search, then sort.
    #[must_use]
    pub fn apply(&self, issues: &[Issue]) -> Vec<Issue> {
        let narrowed: Vec<Issue> = issues
            .iter()
            .filter(|issue| self.filters.matches(issue) && matches_query(issue, &self.search))
            .cloned()
            .collect();
        sort_issues(&narrowed, self.sort)
    }
}
