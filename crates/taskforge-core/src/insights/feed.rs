//! Live metrics: re-scores every task snapshot a [`TaskStore`] publishes.

use chrono::NaiveDate;
use std::cell::RefCell;
use std::rc::Rc;

use super::scorer::{compute_metrics, ProductivityMetrics};
use super::streak::completion_streak;
use crate::focus::FocusAggregate;
use crate::task::store::{SubscriptionId, TaskStore};

pub struct InsightsFeed {
    latest: Rc<RefCell<ProductivityMetrics>>,
    subscription: SubscriptionId,
}

impl InsightsFeed {
    /// Subscribe to `store`. The first snapshot is scored immediately.
    pub fn attach(store: &mut TaskStore, focus: FocusAggregate, today: NaiveDate) -> Self {
        let empty: [crate::task::Task; 0] = [];
        let latest = Rc::new(RefCell::new(compute_metrics(&empty, 0, 0)));
        let sink = Rc::clone(&latest);
        let subscription = store.subscribe(move |tasks| {
            let metrics = compute_metrics(
                tasks,
                focus.total_focus_minutes,
                focus.focus_session_count,
            )
            .with_streak(completion_streak(tasks, today));
            *sink.borrow_mut() = metrics;
        });
        Self {
            latest,
            subscription,
        }
    }

    pub fn latest(&self) -> ProductivityMetrics {
        self.latest.borrow().clone()
    }

    pub fn detach(self, store: &mut TaskStore) -> bool {
        store.unsubscribe(self.subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskDraft};
    use chrono::Utc;

    #[test]
    fn metrics_follow_store_mutations() {
        let mut store = TaskStore::new("alice");
        let focus = FocusAggregate {
            total_focus_minutes: 300,
            focus_session_count: 6,
        };
        let feed = InsightsFeed::attach(&mut store, focus, Utc::now().date_naive());
        assert_eq!(feed.latest().tasks_added, 0);
        assert_eq!(feed.latest().weekly_score, 13);

        let draft = TaskDraft {
            title: "Review budget".into(),
            priority: Priority::High,
            ..Default::default()
        };
        let task = store.add(draft, Utc::now()).unwrap();
        assert_eq!(feed.latest().tasks_added, 1);
        assert_eq!(feed.latest().tasks_completed, 0);

        store.toggle_complete(&task.id, Utc::now()).unwrap();
        let metrics = feed.latest();
        assert_eq!(metrics.tasks_completed, 1);
        // 60 + 12.5 + quiet week 9
        assert_eq!(metrics.weekly_score, 82);
        assert_eq!(metrics.streak, 1);
        assert_eq!(metrics.average_session_length, 50.0);

        assert!(feed.detach(&mut store));
        assert_eq!(store.subscriber_count(), 0);
    }
}
