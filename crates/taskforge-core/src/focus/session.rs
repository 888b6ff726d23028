//! Completed focus sessions and the trailing-window aggregate fed to the scorer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of the scoring window in days.
pub const SCORING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: i64,
    pub duration_min: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub task_id: Option<String>,
}

/// Summed minutes and count of sessions completed inside the scoring window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusAggregate {
    pub total_focus_minutes: u64,
    pub focus_session_count: u64,
}

impl FocusAggregate {
    /// Start of the window ending at `now` (exclusive).
    pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(SCORING_WINDOW_DAYS)
    }

    /// Whether a session completed at `completed_at` counts toward the window ending at `now`.
    pub fn in_window(completed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        completed_at > Self::window_start(now) && completed_at <= now
    }

    /// Aggregate the sessions that completed within the trailing window.
    pub fn from_sessions<'a, I>(sessions: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a FocusSession>,
    {
        sessions
            .into_iter()
            .filter(|s| Self::in_window(s.completed_at, now))
            .fold(Self::default(), |mut acc, s| {
                acc.total_focus_minutes += s.duration_min;
                acc.focus_session_count += 1;
                acc
            })
    }
}
