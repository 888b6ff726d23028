use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::focus::TimerState;

/// Every focus-timer state change produces an Event.
/// The CLI prints them; callers may persist `FocusCompleted` as a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    FocusStarted {
        duration_secs: u64,
        remaining_ms: u64,
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    FocusPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    FocusResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Countdown stopped by the user and rewound to its full length.
    FocusStopped {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Emitted once per session.
    FocusCompleted {
        duration_min: u64,
        started_at: DateTime<Utc>,
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        remaining_ms: u64,
        total_ms: u64,
        progress_pct: f64,
        display: String,
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
}
