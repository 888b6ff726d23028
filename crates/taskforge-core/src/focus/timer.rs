//! Focus countdown.
//!
//! Wall-clock based, like a kitchen timer: no internal thread, the caller
//! invokes `tick()` periodically and receives `FocusCompleted` once the
//! countdown reaches zero.
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v
//!       Completed
//! (stop: any -> Idle, countdown rewound)
//! ```
//!
//! Every command has an `*_at(now_ms)` form taking milliseconds since the
//! epoch so that drivers (tests, the CLI's persisted timer) control time.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;

pub const DEFAULT_FOCUS_MINUTES: u64 = 25;
/// Longest accepted session: one day.
pub const MAX_FOCUS_MINUTES: u64 = 24 * 60;

const MS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusTimer {
    duration_min: u64,
    state: TimerState,
    remaining_ms: u64,
    /// Epoch ms of the last start/resume/tick while running.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    task_id: Option<String>,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new(DEFAULT_FOCUS_MINUTES)
    }
}

impl FocusTimer {
    /// A zero duration falls back to the 25-minute default; anything above
    /// [`MAX_FOCUS_MINUTES`] is clamped to it.
    pub fn new(duration_min: u64) -> Self {
        let duration_min = match duration_min {
            0 => DEFAULT_FOCUS_MINUTES,
            d => d.min(MAX_FOCUS_MINUTES),
        };
        Self {
            duration_min,
            state: TimerState::Idle,
            remaining_ms: duration_min * MS_PER_MINUTE,
            last_tick_epoch_ms: None,
            started_at: None,
            task_id: None,
        }
    }

    /// Like [`FocusTimer::new`], but rejects lengths outside `1..=MAX_FOCUS_MINUTES`.
    pub fn try_new(duration_min: u64) -> Result<Self, ValidationError> {
        if duration_min == 0 || duration_min > MAX_FOCUS_MINUTES {
            return Err(ValidationError::InvalidValue {
                field: "duration_min",
                message: format!("must be between 1 and {MAX_FOCUS_MINUTES} minutes, got {duration_min}"),
            });
        }
        Ok(Self::new(duration_min))
    }

    /// Attach the session to a task.
    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn duration_min(&self) -> u64 {
        self.duration_min
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.duration_min.saturating_mul(MS_PER_MINUTE)
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// 0.0 ..= 100.0
    pub fn progress_pct(&self) -> f64 {
        let total = self.total_ms();
        if total == 0 {
            return 0.0;
        }
        (total - self.remaining_ms.min(total)) as f64 / total as f64 * 100.0
    }

    /// Remaining time as `MM:SS` (whole seconds, rounded up).
    pub fn format_remaining(&self) -> String {
        let secs = self.remaining_ms.div_ceil(1000);
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    pub fn snapshot(&self) -> Event {
        self.snapshot_at(now_ms())
    }

    pub fn snapshot_at(&self, now: u64) -> Event {
        Event::StateSnapshot {
            state: self.state,
            remaining_ms: self.remaining_ms,
            total_ms: self.total_ms(),
            progress_pct: self.progress_pct(),
            display: self.format_remaining(),
            task_id: self.task_id.clone(),
            at: to_datetime(now),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(now_ms())
    }

    /// Start from idle, or continue from paused. Refused once completed.
    pub fn start_at(&mut self, now: u64) -> Option<Event> {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                self.last_tick_epoch_ms = Some(now);
                self.started_at = Some(to_datetime(now));
                Some(Event::FocusStarted {
                    duration_secs: self.duration_min.saturating_mul(60),
                    remaining_ms: self.remaining_ms,
                    task_id: self.task_id.clone(),
                    at: to_datetime(now),
                })
            }
            TimerState::Paused => self.resume_at(now),
            TimerState::Running | TimerState::Completed => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(now_ms())
    }

    pub fn pause_at(&mut self, now: u64) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(now);
        self.state = TimerState::Paused;
        self.last_tick_epoch_ms = None;
        Some(Event::FocusPaused {
            remaining_ms: self.remaining_ms,
            at: to_datetime(now),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.resume_at(now_ms())
    }

    pub fn resume_at(&mut self, now: u64) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        self.last_tick_epoch_ms = Some(now);
        Some(Event::FocusResumed {
            remaining_ms: self.remaining_ms,
            at: to_datetime(now),
        })
    }

    pub fn stop(&mut self) -> Option<Event> {
        self.stop_at(now_ms())
    }

    /// Rewind to the full duration. No-op on an untouched idle timer.
    pub fn stop_at(&mut self, now: u64) -> Option<Event> {
        if self.state == TimerState::Idle && self.remaining_ms == self.total_ms() {
            return None;
        }
        if self.state == TimerState::Running {
            self.flush_elapsed(now);
        }
        let elapsed_ms = self.total_ms().saturating_sub(self.remaining_ms);
        self.state = TimerState::Idle;
        self.remaining_ms = self.total_ms();
        self.last_tick_epoch_ms = None;
        self.started_at = None;
        Some(Event::FocusStopped {
            elapsed_ms,
            at: to_datetime(now),
        })
    }

    /// Change the session length. Rewinds the countdown.
    pub fn set_duration(&mut self, duration_min: u64) {
        let task_id = self.task_id.take();
        *self = Self::new(duration_min);
        self.task_id = task_id;
    }

    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms())
    }

    /// Returns `FocusCompleted` on the tick that reaches zero.
    pub fn tick_at(&mut self, now: u64) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(now);
        if self.remaining_ms > 0 {
            return None;
        }
        self.state = TimerState::Completed;
        self.last_tick_epoch_ms = None;
        let at = to_datetime(now);
        Some(Event::FocusCompleted {
            duration_min: self.duration_min,
            started_at: self.started_at.unwrap_or(at),
            task_id: self.task_id.clone(),
            at,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self, now: u64) {
        if let Some(last) = self.last_tick_epoch_ms {
            let elapsed = now.saturating_sub(last);
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_epoch_ms = Some(now);
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn to_datetime(epoch_ms: u64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(epoch_ms as i64)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_766_484_000_000;
    const MIN: u64 = 60_000;

    #[test]
    fn start_pause_resume() {
        let mut timer = FocusTimer::new(25);
        assert_eq!(timer.state(), TimerState::Idle);

        assert!(timer.start_at(T0).is_some());
        assert_eq!(timer.state(), TimerState::Running);
        assert!(timer.start_at(T0).is_none());

        let paused = timer.pause_at(T0 + 5 * MIN).unwrap();
        assert!(matches!(paused, Event::FocusPaused { remaining_ms, .. } if remaining_ms == 20 * MIN));

        // time passing while paused does not count
        assert!(timer.tick_at(T0 + 30 * MIN).is_none());
        assert_eq!(timer.remaining_ms(), 20 * MIN);

        assert!(timer.resume_at(T0 + 30 * MIN).is_some());
        assert!(timer.tick_at(T0 + 40 * MIN).is_none());
        assert_eq!(timer.remaining_ms(), 10 * MIN);
    }

    #[test]
    fn start_while_paused_resumes() {
        let mut timer = FocusTimer::new(10);
        timer.start_at(T0);
        timer.pause_at(T0 + MIN);
        let event = timer.start_at(T0 + 2 * MIN).unwrap();
        assert!(matches!(event, Event::FocusResumed { .. }));
    }

    #[test]
    fn completes_exactly_once() {
        let mut timer = FocusTimer::new(1).with_task("task-1");
        timer.start_at(T0);
        let done = timer.tick_at(T0 + 2 * MIN).unwrap();
        match done {
            Event::FocusCompleted {
                duration_min,
                task_id,
                started_at,
                ..
            } => {
                assert_eq!(duration_min, 1);
                assert_eq!(task_id.as_deref(), Some("task-1"));
                assert_eq!(started_at, to_datetime(T0));
            }
            other => panic!("expected FocusCompleted, got {other:?}"),
        }
        assert_eq!(timer.state(), TimerState::Completed);
        assert!(timer.tick_at(T0 + 3 * MIN).is_none());
        // a finished countdown cannot be restarted without stopping
        assert!(timer.start_at(T0 + 3 * MIN).is_none());
    }

    #[test]
    fn stop_rewinds() {
        let mut timer = FocusTimer::new(25);
        assert!(timer.stop_at(T0).is_none());

        timer.start_at(T0);
        let stopped = timer.stop_at(T0 + 3 * MIN).unwrap();
        assert!(matches!(stopped, Event::FocusStopped { elapsed_ms, .. } if elapsed_ms == 3 * MIN));
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_ms(), 25 * MIN);
        assert!(timer.start_at(T0 + 4 * MIN).is_some());
    }

    #[test]
    fn progress_and_display() {
        let mut timer = FocusTimer::new(10);
        assert_eq!(timer.format_remaining(), "10:00");
        timer.start_at(T0);
        timer.tick_at(T0 + 2 * MIN + 30_000);
        assert_eq!(timer.format_remaining(), "07:30");
        assert!((timer.progress_pct() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zero_duration_uses_default() {
        assert_eq!(FocusTimer::new(0).duration_min(), DEFAULT_FOCUS_MINUTES);
    }

    #[test]
    fn set_duration_keeps_task() {
        let mut timer = FocusTimer::new(25).with_task("t");
        timer.start_at(T0);
        timer.set_duration(50);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_ms(), 50 * MIN);
        assert_eq!(timer.task_id(), Some("t"));
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let timer = FocusTimer::default();
        match timer.snapshot_at(T0) {
            Event::StateSnapshot {
                state,
                remaining_ms,
                display,
                ..
            } => {
                assert_eq!(state, TimerState::Idle);
                assert_eq!(remaining_ms, 25 * MIN);
                assert_eq!(display, "25:00");
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[test]
    fn timer_survives_serde_roundtrip() {
        let mut timer = FocusTimer::new(15);
        timer.start_at(T0);
        let json = serde_json::to_string(&timer).unwrap();
        let mut restored: FocusTimer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state(), TimerState::Running);
        restored.tick_at(T0 + 5 * MIN);
        assert_eq!(restored.remaining_ms(), 10 * MIN);
    }

    #[test]
    fn oversized_durations_are_bounded() {
        assert!(FocusTimer::try_new(u64::MAX).is_err());
        assert!(FocusTimer::try_new(MAX_FOCUS_MINUTES + 1).is_err());
        assert!(FocusTimer::try_new(0).is_err());
        assert_eq!(FocusTimer::try_new(MAX_FOCUS_MINUTES).unwrap().duration_min(), MAX_FOCUS_MINUTES);

        let clamped = FocusTimer::new(u64::MAX);
        assert_eq!(clamped.duration_min(), MAX_FOCUS_MINUTES);
        assert_eq!(clamped.remaining_ms(), MAX_FOCUS_MINUTES * MIN);

        let mut timer = FocusTimer::new(25).with_task("t-1");
        timer.set_duration(u64::MAX);
        assert_eq!(timer.total_ms(), MAX_FOCUS_MINUTES * MIN);
        assert_eq!(timer.task_id(), Some("t-1"));
    }

    #[test]
    fn restored_state_with_huge_duration_does_not_overflow() {
        let json = r#"{"duration_min":18446744073709551615,"state":"idle","remaining_ms":0}"#;
        let timer: FocusTimer = serde_json::from_str(json).unwrap();
        assert_eq!(timer.total_ms(), u64::MAX);
        assert!(timer.progress_pct() <= 100.0);
    }
}
