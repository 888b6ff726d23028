//! Completion streak: consecutive UTC days with at least one completed task.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

use crate::task::Task;

/// Count consecutive completion days ending today.
///
/// A streak that has not been extended yet today still counts from
/// yesterday; it only breaks once a whole day passes without a completion.
pub fn completion_streak(tasks: &[Task], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = tasks
        .iter()
        .filter(|t| t.completed)
        .filter_map(|t| t.completed_at)
        .map(|at| at.date_naive())
        .filter(|d| *d <= today)
        .collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}
