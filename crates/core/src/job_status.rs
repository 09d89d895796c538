//! Derived job status.
//!
//! The registry stores only `enabled` and `last_run_at`; the
//! user-facing status is computed from those two fields plus a
//! freshness window. The `embedding_job_status` view in the migrations
//! applies the same rule in SQL.

use chrono::Duration;

use crate::types::Timestamp;

/// A job is `Stale` once its last completed cycle is older than this.
pub const FRESHNESS_WINDOW_SECS: i64 = 3600;

/// Derived status of an embedding job.
///
/// | Condition                                   | Status   |
/// |---------------------------------------------|----------|
/// | `enabled = false`                           | Disabled |
/// | enabled, `last_run_at` is NULL              | NeverRun |
/// | enabled, last run older than the window     | Stale    |
/// | enabled, last run within the window         | Active   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Disabled,
    NeverRun,
    Stale,
    Active,
}

impl JobStatus {
    /// Compute the status as of `now`.
    pub fn derive(enabled: bool, last_run_at: Option<Timestamp>, now: Timestamp) -> Self {
        if !enabled {
            return Self::Disabled;
        }
        match last_run_at {
            None => Self::NeverRun,
            Some(last) if now - last > Duration::seconds(FRESHNESS_WINDOW_SECS) => Self::Stale,
            Some(_) => Self::Active,
        }
    }

    /// Label matching the `status` column of the `embedding_job_status` view.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NeverRun => "never run",
            Self::Stale => "stale",
            Self::Active => "active",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn disabled_wins_over_everything() {
        let now = Utc::now();
        assert_eq!(
            JobStatus::derive(false, Some(now), now),
            JobStatus::Disabled
        );
        assert_eq!(JobStatus::derive(false, None, now), JobStatus::Disabled);
    }

    #[test]
    fn never_run_when_no_last_run() {
        let now = Utc::now();
        assert_eq!(JobStatus::derive(true, None, now), JobStatus::NeverRun);
    }

    #[test]
    fn active_within_freshness_window() {
        let now = Utc::now();
        let recent = now - Duration::seconds(FRESHNESS_WINDOW_SECS - 1);
        assert_eq!(JobStatus::derive(true, Some(recent), now), JobStatus::Active);
    }

    #[test]
    fn stale_past_freshness_window() {
        let now = Utc::now();
        let old = now - Duration::seconds(FRESHNESS_WINDOW_SECS + 1);
        assert_eq!(JobStatus::derive(true, Some(old), now), JobStatus::Stale);
    }

    #[test]
    fn labels_match_view_values() {
        assert_eq!(JobStatus::Disabled.label(), "disabled");
        assert_eq!(JobStatus::NeverRun.label(), "never run");
        assert_eq!(JobStatus::Stale.label(), "stale");
        assert_eq!(JobStatus::Active.label(), "active");
    }
}
