//! # TaskForge Core Library
//!
//! Core business logic for TaskForge, a task manager with focus sessions and
//! a weekly productivity score. Everything is available through the
//! standalone `taskforge` CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Insights**: A pure scorer turning tasks and focus minutes into a
//!   0-100 weekly score, plus streak, rating and suggestion helpers
//! - **Tasks**: Task records, edit operations, role-based sharing, and an
//!   in-memory store that pushes snapshots to subscribers
//! - **Focus**: A wall-clock countdown timer that requires the caller to
//!   periodically invoke `tick()`, and the 7-day session aggregate
//! - **Storage**: SQLite persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`compute_metrics`]: Weekly productivity scoring
//! - [`TaskStore`]: Live task collection with subscriptions
//! - [`FocusTimer`]: Focus countdown state machine
//! - [`Database`]: Task, session and user persistence
//! - [`Config`]: Application configuration management

pub mod calendar;
pub mod error;
pub mod events;
pub mod focus;
pub mod insights;
pub mod storage;
pub mod task;

pub use error::{ConfigError, CoreError, DatabaseError, SharingError, ValidationError};
pub use events::Event;
pub use focus::{FocusAggregate, FocusSession, FocusTimer, TimerState};
pub use insights::{
    compute_metrics, completion_streak, InsightsFeed, InsightsReport, ProductivityMetrics,
    ScoreBreakdown, ScoreRating, ScoredTask, Suggestion,
};
pub use storage::{Config, Database, UserRecord};
pub use task::sharing::Capability;
pub use task::store::TaskStore;
pub use task::{DueLabel, PermissionLevel, Priority, Task, TaskDraft, TaskUpdate};
