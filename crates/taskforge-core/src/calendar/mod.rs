//! Month view helpers: which pending tasks fall due on which day.
//!
//! Days are UTC calendar days.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::task::{Priority, Task};

/// Per-day counts shown in a calendar cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub total: usize,
    pub high_priority: usize,
}

/// Pending tasks whose due date falls on `date`.
pub fn tasks_due_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| !t.completed)
        .filter(|t| t.due_date.map(|d| d.date_naive()) == Some(date))
        .collect()
}

pub fn day_summary(tasks: &[Task], date: NaiveDate) -> DaySummary {
    let due = tasks_due_on(tasks, date);
    DaySummary {
        total: due.len(),
        high_priority: due.iter().filter(|t| t.priority == Priority::High).count(),
    }
}

/// All dates of a month, first to last.
pub fn month_days(year: i32, month: u32) -> Result<Vec<NaiveDate>, ValidationError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| ValidationError::InvalidValue {
        field: "month",
        message: format!("{year}-{month:02} is not a valid month"),
    })?;
    Ok(first
        .iter_days()
        .take_while(|d| d.month() == month && d.year() == year)
        .collect())
}

/// Days of `year`/`month` that have at least one pending task due.
pub fn busy_days(tasks: &[Task], year: i32, month: u32) -> Result<Vec<(NaiveDate, DaySummary)>, ValidationError> {
    Ok(month_days(year, month)?
        .into_iter()
        .map(|d| (d, day_summary(tasks, d)))
        .filter(|(_, s)| s.total > 0)
        .collect())
}
