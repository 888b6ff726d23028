//! Integration tests for the insights pipeline.
//!
//! Tests the full workflow from stored tasks and focus sessions to the
//! weekly report, using an on-disk database.

use chrono::{Duration, TimeZone, Utc};
use taskforge_core::insights::score_breakdown;
use taskforge_core::{
    completion_streak, compute_metrics, Database, InsightsFeed, InsightsReport, Priority,
    ScoreRating, Suggestion, Task, TaskDraft, TaskStore,
};

fn draft(title: &str, priority: Priority) -> TaskDraft {
    TaskDraft {
        title: title.into(),
        priority,
        ..Default::default()
    }
}

#[test]
fn test_full_week_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("taskforge.db")).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 12, 23, 18, 0, 0).unwrap();

    // Three high, one medium, one low; finish the high ones over three days.
    let mut tasks = Vec::new();
    for (i, priority) in [
        Priority::High,
        Priority::High,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ]
    .into_iter()
    .enumerate()
    {
        let task = Task::new(draft(&format!("task {i}"), priority), "alice", now - Duration::days(5)).unwrap();
        db.insert_task(&task).unwrap();
        tasks.push(task);
    }
    for (offset, task) in tasks.iter_mut().take(3).enumerate() {
        task.toggle_complete(now - Duration::days(offset as i64));
        db.update_task(task).unwrap();
    }

    // 12 sessions of 50 minutes this week, plus one from last month.
    for day in 0..6 {
        for slot in 0..2 {
            let done = now - Duration::days(day) - Duration::hours(slot * 2 + 1);
            db.record_focus_session(50, done - Duration::minutes(50), done, None)
                .unwrap();
        }
    }
    let old = now - Duration::days(30);
    db.record_focus_session(50, old - Duration::minutes(50), old, None)
        .unwrap();

    let aggregate = db.focus_aggregate(now).unwrap();
    assert_eq!(aggregate.total_focus_minutes, 600);
    assert_eq!(aggregate.focus_session_count, 12);

    let stored = db.list_tasks_for("alice").unwrap();
    let metrics = compute_metrics(&stored, aggregate.total_focus_minutes, aggregate.focus_session_count)
        .with_streak(completion_streak(&stored, now.date_naive()));

    // weights 9 of 12 -> 45, focus goal met -> 25, quiet week -> 9
    assert_eq!(metrics.weekly_score, 79);
    assert_eq!(metrics.tasks_completed, 3);
    assert_eq!(metrics.tasks_added, 5);
    assert_eq!(metrics.average_session_length, 50.0);
    assert_eq!(metrics.streak, 3);

    let breakdown = score_breakdown(&stored, aggregate.total_focus_minutes);
    let report = InsightsReport::new(metrics, breakdown, 120);
    assert_eq!(report.rating, ScoreRating::Good);
    assert!((report.focus_goal_pct - 600.0 / 840.0 * 100.0).abs() < 1e-9);
    // 3 < 5 * 0.7
    assert_eq!(report.suggestions, vec![Suggestion::FocusOnCompletion]);
}

#[test]
fn test_feed_tracks_store_backed_by_database() {
    let db = Database::open_memory().unwrap();
    let now = Utc::now();
    let done = now - Duration::minutes(5);
    db.record_focus_session(25, done - Duration::minutes(25), done, None)
        .unwrap();

    let mut store = TaskStore::with_tasks("alice", db.list_tasks_for("alice").unwrap());
    let feed = InsightsFeed::attach(&mut store, db.focus_aggregate(now).unwrap(), now.date_naive());
    assert_eq!(feed.latest().focus_sessions, 1);
    assert_eq!(feed.latest().tasks_added, 0);

    let task = store.add(draft("Write report", Priority::Medium), now).unwrap();
    db.insert_task(&task).unwrap();
    let task = store.toggle_complete(&task.id, now).unwrap();
    db.update_task(&task).unwrap();

    let live = feed.latest();
    let reloaded = db.list_tasks_for("alice").unwrap();
    let fresh = compute_metrics(&reloaded, 25, 1).with_streak(completion_streak(&reloaded, now.date_naive()));
    assert_eq!(live, fresh);
    assert_eq!(live.completion_ratio, 1.0);
}

#[test]
fn test_scorer_accepts_plain_tuples() {
    let stored = vec![(Priority::High, true), (Priority::Low, false)];
    let metrics = compute_metrics(&stored, 0, 0);
    // 3 of 4 weight -> 45, quiet week -> 9
    assert_eq!(metrics.weekly_score, 54);
    assert_eq!(ScoreRating::from_score(metrics.weekly_score), ScoreRating::NeedsWork);
}
