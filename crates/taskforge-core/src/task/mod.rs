//! Task records and the edits a user can make to them.
//!
//! A task is owned by one user and may be shared with others through its
//! role map (see [`sharing`]). The productivity scorer only reads
//! `priority` and `completed`; everything else is bookkeeping for the
//! task list, calendar and sharing views.

pub mod sharing;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
pub use sharing::PermissionLevel;

/// Priority tier of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Display order used by the task list: most urgent first.
    pub const DISPLAY_ORDER: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::UnknownVariant {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

/// A task as stored and shared between users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    /// 0..=100
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    pub completed: bool,
    pub owner_id: String,
    /// Flat user-id -> role map; always contains the owner.
    #[serde(default)]
    pub roles: BTreeMap<String, PermissionLevel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// User-supplied fields for a new task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub tags: Vec<String>,
}

/// Partial edit; `None` leaves a field untouched.
///
/// `description` and `due_date` are doubly optional so an edit can clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub estimated_hours: Option<Option<f64>>,
    pub progress: Option<u8>,
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }
}

impl Task {
    /// Create a task owned by `owner_id`.
    ///
    /// # Errors
    /// Returns a validation error for an empty title or a non-positive estimate.
    pub fn new(draft: TaskDraft, owner_id: &str, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let title = validate_title(&draft.title)?;
        validate_estimate(draft.estimated_hours)?;

        let mut roles = BTreeMap::new();
        roles.insert(owner_id.to_string(), PermissionLevel::Owner);

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: normalize_description(draft.description),
            priority: draft.priority,
            due_date: draft.due_date,
            estimated_hours: draft.estimated_hours,
            progress: 0,
            tags: draft.tags,
            completed: false,
            owner_id: owner_id.to_string(),
            roles,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Apply a partial edit and bump `updated_at`.
    ///
    /// Validation happens before any field is touched, so a rejected edit
    /// leaves the task unchanged.
    pub fn apply(&mut self, update: TaskUpdate, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let title = update.title.as_deref().map(validate_title).transpose()?;
        if let Some(estimate) = update.estimated_hours {
            validate_estimate(estimate)?;
        }
        if let Some(progress) = update.progress {
            validate_progress(progress)?;
        }

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = normalize_description(description);
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(due) = update.due_date {
            self.due_date = due;
        }
        if let Some(estimate) = update.estimated_hours {
            self.estimated_hours = estimate;
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Flip the completion flag.
    ///
    /// Completing sets progress to 100 and stamps `completed_at`; reopening
    /// clears the stamp but keeps progress.
    pub fn toggle_complete(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        if self.completed {
            self.progress = 100;
            self.completed_at = Some(now);
        } else {
            self.completed_at = None;
        }
        self.updated_at = now;
    }

    pub fn due_label(&self, now: DateTime<Utc>) -> Option<DueLabel> {
        self.due_date.map(|due| DueLabel::for_due(due, now))
    }
}

/// Relative due-date label shown on task cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "days")]
pub enum DueLabel {
    Overdue,
    Today,
    Tomorrow,
    InDays(i64),
}

impl DueLabel {
    /// Classify by whole days remaining, rounded up.
    pub fn for_due(due: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        const DAY_MS: i64 = 24 * 60 * 60 * 1000;
        let diff_ms = (due - now).num_milliseconds();
        // ceil division that also works for negative differences
        let days = if diff_ms > 0 {
            (diff_ms + DAY_MS - 1) / DAY_MS
        } else {
            diff_ms / DAY_MS
        };

        match days {
            d if d < 0 => DueLabel::Overdue,
            0 => DueLabel::Today,
            1 => DueLabel::Tomorrow,
            d => DueLabel::InDays(d),
        }
    }
}

impl fmt::Display for DueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueLabel::Overdue => f.write_str("Overdue"),
            DueLabel::Today => f.write_str("Today"),
            DueLabel::Tomorrow => f.write_str("Tomorrow"),
            DueLabel::InDays(d) => write!(f, "{d} days"),
        }
    }
}

/// Incomplete tasks grouped high -> medium -> low. Empty groups are omitted.
pub fn pending_by_priority(tasks: &[Task]) -> Vec<(Priority, Vec<&Task>)> {
    Priority::DISPLAY_ORDER
        .iter()
        .filter_map(|&priority| {
            let group: Vec<&Task> = tasks
                .iter()
                .filter(|t| !t.completed && t.priority == priority)
                .collect();
            (!group.is_empty()).then_some((priority, group))
        })
        .collect()
}

/// Split a comma-separated tag string, trimming and dropping empties.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty("title"));
    }
    Ok(trimmed.to_string())
}

fn validate_estimate(hours: Option<f64>) -> Result<(), ValidationError> {
    match hours {
        Some(h) if !h.is_finite() || h <= 0.0 => Err(ValidationError::InvalidValue {
            field: "estimated_hours",
            message: format!("expected a positive number of hours, got {h}"),
        }),
        _ => Ok(()),
    }
}

fn validate_progress(progress: u8) -> Result<(), ValidationError> {
    if progress > 100 {
        return Err(ValidationError::InvalidValue {
            field: "progress",
            message: format!("must be between 0 and 100, got {progress}"),
        });
    }
    Ok(())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 23, 10, 0, 0).unwrap()
    }

    fn draft(title: &str, priority: Priority) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            priority,
            ..Default::default()
        }
    }

    #[test]
    fn new_task_defaults() {
        let task = Task::new(draft("  Review budget ", Priority::High), "alice", now()).unwrap();
        assert_eq!(task.title, "Review budget");
        assert_eq!(task.progress, 0);
        assert!(!task.completed);
        assert_eq!(task.roles.get("alice"), Some(&PermissionLevel::Owner));
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn new_task_rejects_blank_title() {
        let err = Task::new(draft("   ", Priority::Low), "alice", now()).unwrap_err();
        assert!(matches!(err, ValidationError::Empty("title")));
    }

    #[test]
    fn new_task_rejects_negative_estimate() {
        let mut d = draft("Docs", Priority::Low);
        d.estimated_hours = Some(-1.0);
        assert!(Task::new(d, "alice", now()).is_err());
    }

    #[test]
    fn toggle_complete_sets_progress_and_timestamp() {
        let mut task = Task::new(draft("Docs", Priority::Medium), "alice", now()).unwrap();
        let later = now() + Duration::hours(2);
        task.toggle_complete(later);
        assert!(task.completed);
        assert_eq!(task.progress, 100);
        assert_eq!(task.completed_at, Some(later));

        task.toggle_complete(later + Duration::hours(1));
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn apply_edits_selected_fields() {
        let mut task = Task::new(draft("Docs", Priority::Medium), "alice", now()).unwrap();
        let later = now() + Duration::minutes(5);
        task.apply(
            TaskUpdate {
                priority: Some(Priority::High),
                progress: Some(40),
                description: Some(Some("API guides".into())),
                ..Default::default()
            },
            later,
        )
        .unwrap();
        assert_eq!(task.title, "Docs");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.progress, 40);
        assert_eq!(task.description.as_deref(), Some("API guides"));
        assert_eq!(task.updated_at, later);
    }

    #[test]
    fn rejected_edit_leaves_task_untouched() {
        let mut task = Task::new(draft("Docs", Priority::Medium), "alice", now()).unwrap();
        let before = task.clone();
        let result = task.apply(
            TaskUpdate {
                title: Some("New".into()),
                progress: Some(150),
                ..Default::default()
            },
            now() + Duration::minutes(1),
        );
        assert!(result.is_err());
        assert_eq!(task, before);
    }

    #[test]
    fn due_labels() {
        let n = now();
        assert_eq!(DueLabel::for_due(n - Duration::days(2), n), DueLabel::Overdue);
        assert_eq!(DueLabel::for_due(n, n), DueLabel::Today);
        assert_eq!(DueLabel::for_due(n - Duration::hours(3), n), DueLabel::Today);
        assert_eq!(DueLabel::for_due(n + Duration::hours(3), n), DueLabel::Tomorrow);
        assert_eq!(DueLabel::for_due(n + Duration::days(1), n), DueLabel::Tomorrow);
        assert_eq!(DueLabel::for_due(n + Duration::days(4), n), DueLabel::InDays(4));
        assert_eq!(DueLabel::InDays(4).to_string(), "4 days");
    }

    #[test]
    fn pending_groups_in_display_order() {
        let mut done = Task::new(draft("Done", Priority::High), "a", now()).unwrap();
        done.toggle_complete(now());
        let tasks = vec![
            Task::new(draft("Low", Priority::Low), "a", now()).unwrap(),
            done,
            Task::new(draft("High", Priority::High), "a", now()).unwrap(),
        ];
        let groups = pending_by_priority(&tasks);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Priority::High);
        assert_eq!(groups[0].1[0].title, "High");
        assert_eq!(groups[1].0, Priority::Low);
    }

    #[test]
    fn parse_tags_trims_and_drops_empty() {
        assert_eq!(parse_tags("finance, urgent,, "), vec!["finance", "urgent"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn task_serialization() {
        let task = Task::new(draft("Docs", Priority::Low), "alice", now()).unwrap();
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"priority\":\"low\""));
        assert!(json.contains("\"alice\":\"owner\""));
        let decoded: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, task);
    }
}
