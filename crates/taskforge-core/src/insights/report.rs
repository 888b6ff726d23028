//! Dashboard view of the metrics: rating band, goal progress and suggestions.

use serde::{Deserialize, Serialize};

use super::scorer::{ProductivityMetrics, ScoreBreakdown};

/// Default daily focus goal for the goal-progress figure (two hours).
pub const DEFAULT_DAILY_FOCUS_GOAL_MINUTES: u64 = 120;

const COMPLETION_TARGET: f64 = 0.7;
const MIN_FOCUS_SESSIONS: u64 = 5;
const STREAK_CELEBRATION_DAYS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRating {
    Great,
    Good,
    NeedsWork,
}

impl ScoreRating {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 80 => ScoreRating::Great,
            s if s >= 60 => ScoreRating::Good,
            _ => ScoreRating::NeedsWork,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreRating::Great => "Great",
            ScoreRating::Good => "Good",
            ScoreRating::NeedsWork => "Needs Work",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// Fewer than 70% of added tasks are done.
    FocusOnCompletion,
    /// Fewer than five focus sessions this week.
    MoreFocusSessions,
    KeepStreak { days: u32 },
}

impl Suggestion {
    pub fn message(&self) -> String {
        match self {
            Suggestion::FocusOnCompletion => "You have many pending tasks. Try finishing existing ones before adding new ones.".to_string(),
            Suggestion::MoreFocusSessions => "Try using more focus sessions to improve concentration and productivity.".to_string(),
            Suggestion::KeepStreak { days } => format!("Great job maintaining your {days}-day streak! Keep it up!"),
        }
    }
}

pub fn suggestions(metrics: &ProductivityMetrics) -> Vec<Suggestion> {
    let mut out = Vec::new();
    if (metrics.tasks_completed as f64) < metrics.tasks_added as f64 * COMPLETION_TARGET {
        out.push(Suggestion::FocusOnCompletion);
    }
    if metrics.focus_sessions < MIN_FOCUS_SESSIONS {
        out.push(Suggestion::MoreFocusSessions);
    }
    if metrics.streak >= STREAK_CELEBRATION_DAYS {
        out.push(Suggestion::KeepStreak { days: metrics.streak });
    }
    out
}

/// Percentage of a week's worth of the daily focus goal. Not capped.
pub fn focus_goal_pct(total_focus_minutes: u64, daily_goal_minutes: u64) -> f64 {
    let weekly = daily_goal_minutes.saturating_mul(7);
    if weekly == 0 {
        return 0.0;
    }
    total_focus_minutes as f64 / weekly as f64 * 100.0
}

/// Everything the insights view renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub metrics: ProductivityMetrics,
    pub rating: ScoreRating,
    pub breakdown: ScoreBreakdown,
    pub focus_goal_pct: f64,
    pub suggestions: Vec<Suggestion>,
}

impl InsightsReport {
    pub fn new(metrics: ProductivityMetrics, breakdown: ScoreBreakdown, daily_goal_minutes: u64) -> Self {
        Self {
            rating: ScoreRating::from_score(metrics.weekly_score),
            focus_goal_pct: focus_goal_pct(metrics.total_focus_time, daily_goal_minutes),
            suggestions: suggestions(&metrics),
            breakdown,
            metrics,
        }
    }
}
