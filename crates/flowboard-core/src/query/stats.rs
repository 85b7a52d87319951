use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::sort::{SortKey, SortSpec, sort_issues};
use crate::model::{Issue, Priority, Status};

/// Most recently updated issues shown on the dashboard.
pub const RECENT_LIMIT: usize = 6;
/// Open high/critical issues shown on the dashboard.
pub const HIGH_PRIORITY_LIMIT: usize = 4;

/// Aggregate counters and short lists for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    /// Issues whose status is not `done`.
    pub open: usize,
    pub critical: usize,
    /// Count per status; every status is present, zero when unused.
    pub by_status: BTreeMap<Status, usize>,
    /// Updated within the recent window, newest first.
    pub recent: Vec<Issue>,
    /// High or critical priority and not done, in input order.
    pub high_priority_open: Vec<Issue>,
}

impl DashboardStats {
    /// Compute dashboard figures as of `now`. An issue is recent when it was
    /// updated less than `recent_days + 1` whole days ago.
    #[must_use]
    pub fn compute(issues: &[Issue], now: DateTime<Utc>, recent_days: u32) -> Self {
        let mut by_status: BTreeMap<Status, usize> =
            Status::ALL.iter().map(|status| (*status, 0)).collect();
        for issue in issues {
            *by_status.entry(issue.status).or_default() += 1;
        }

        let recent_candidates: Vec<Issue> = issues
            .iter()
            .filter(|issue| (now - issue.updated_at).num_days() <= i64::from(recent_days))
            .cloned()
            .collect();
        let mut recent = sort_issues(&recent_candidates, SortSpec::desc(SortKey::UpdatedAt));
        recent.truncate(RECENT_LIMIT);

        let high_priority_open = issues
            .iter()
            .filter(|issue| issue.priority >= Priority::High && issue.status.is_open())
            .take(HIGH_PRIORITY_LIMIT)
            .cloned()
            .collect();

        Self {
            total: issues.len(),
            open: issues.iter().filter(|issue| issue.status.is_open()).count(),
            critical: issues
                .iter()
                .filter(|issue| issue.priority == Priority::Critical)
                .count(),
            by_status,
            recent,
            high_priority_open,
        }
    }

    /// Share of issues that are done, in percent (0 when empty).
    #[must_use]
    pub fn completion_percent(&self) -> u32 {
        let done = self.by_status.get(&Status::Done).copied().unwrap_or(0);
        if self.total == 0 {
            return 0;
        }
        u32::try_from(done * 100 / self.total).unwrap_or(100)
    }
}
