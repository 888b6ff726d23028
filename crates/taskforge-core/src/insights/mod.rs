//! Productivity insights.
//!
//! [`compute_metrics`] is the pure scoring entry point. The remaining
//! pieces (streak, feed, report) wrap it for the dashboard and the CLI.

mod feed;
mod report;
mod scorer;
mod streak;

pub use feed::InsightsFeed;
pub use report::{
    focus_goal_pct, suggestions, InsightsReport, ScoreRating, Suggestion,
    DEFAULT_DAILY_FOCUS_GOAL_MINUTES,
};
pub use scorer::{
    compute_metrics, focus_adequacy_score, momentum_score, priority_completion_score,
    score_breakdown, ProductivityMetrics, ScoreBreakdown, ScoredTask, FOCUS_POINTS,
    HIGH_COMPLETED_THRESHOLD, HIGH_TOTAL_THRESHOLD, HIGH_UPCOMING_THRESHOLD,
    PRIORITY_COMPLETION_POINTS, WEEKLY_FOCUS_GOAL_MINUTES,
};
pub use streak::completion_streak;
