//! Focus timer commands. The timer lives in the kv store between invocations.

use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use taskforge_core::insights::focus_goal_pct;
use taskforge_core::{Config, Database, Event, FocusTimer, TimerState};

use super::{print_json, CliResult};

const TIMER_KEY: &str = "focus_timer";

#[derive(Subcommand)]
pub enum FocusAction {
    /// Start a focus session (or continue a paused one)
    Start {
        /// Session length in minutes (default: focus.default_duration_min)
        #[arg(long)]
        minutes: Option<u64>,
        /// Task the session is for
        #[arg(long)]
        task: Option<String>,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Stop and rewind the session
    Stop,
    /// Print current timer state as JSON
    Status,
    /// List completed focus sessions
    Log {
        /// How many days back to show
        #[arg(long, default_value = "7")]
        days: i64,
    },
    /// Focus totals for the trailing week
    Summary {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

/// Stored timer, or a fresh one. Only undecodable state is discarded;
/// database errors propagate so a live session is never overwritten.
fn load_timer(db: &Database, config: &Config) -> CliResult<FocusTimer> {
    if let Some(json) = db.kv_get(TIMER_KEY)? {
        match serde_json::from_str::<FocusTimer>(&json) {
            Ok(timer) => return Ok(timer),
            Err(e) => tracing::warn!(error = %e, "discarding unreadable focus timer state"),
        }
    }
    Ok(FocusTimer::try_new(config.focus.default_duration_min)?)
}

/// Start of the `days`-long window ending now.
fn log_window_start(days: i64) -> CliResult<DateTime<Utc>> {
    let out_of_range = || format!("--days {days} is out of range");
    if days < 0 {
        return Err(out_of_range().into());
    }
    let span = Duration::try_days(days).ok_or_else(out_of_range)?;
    Ok(Utc::now().checked_sub_signed(span).ok_or_else(out_of_range)?)
}

fn save_timer(db: &Database, timer: &FocusTimer) -> CliResult {
    let json = serde_json::to_string(timer)?;
    db.kv_set(TIMER_KEY, &json)?;
    Ok(())
}

/// Advance the countdown; a session that reached zero is written to the log.
fn settle(db: &Database, timer: &mut FocusTimer) -> CliResult<Option<Event>> {
    let completed = timer.tick();
    if let Some(Event::FocusCompleted {
        duration_min,
        started_at,
        ref task_id,
        at,
    }) = completed
    {
        db.record_focus_session(duration_min, started_at, at, task_id.as_deref())?;
    }
    Ok(completed)
}

fn print_event_or_snapshot(event: Option<Event>, timer: &FocusTimer) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&timer.snapshot()),
    }
}

pub fn run(action: FocusAction) -> CliResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut timer = load_timer(&db, &config)?;

    if let Some(done) = settle(&db, &mut timer)? {
        print_json(&done)?;
    }

    match action {
        FocusAction::Start { minutes, task } => {
            let fresh = matches!(timer.state(), TimerState::Idle | TimerState::Completed);
            if fresh {
                timer = FocusTimer::try_new(minutes.unwrap_or(config.focus.default_duration_min))?;
                if let Some(task_id) = task {
                    timer = timer.with_task(task_id);
                }
            } else if minutes.is_some() || task.is_some() {
                return Err("a session is already in progress; stop it before changing it".into());
            }
            let event = timer.start();
            print_event_or_snapshot(event, &timer)?;
        }
        FocusAction::Pause => {
            let event = timer.pause();
            print_event_or_snapshot(event, &timer)?;
        }
        FocusAction::Resume => {
            let event = timer.resume();
            print_event_or_snapshot(event, &timer)?;
        }
        FocusAction::Stop => {
            let event = timer.stop();
            print_event_or_snapshot(event, &timer)?;
        }
        FocusAction::Status => {
            print_json(&timer.snapshot())?;
        }
        FocusAction::Log { days } => {
            let since = log_window_start(days)?;
            let sessions = db.focus_sessions_since(since)?;
            print_json(&sessions)?;
        }
        FocusAction::Summary { json } => {
            let aggregate = db.focus_aggregate(Utc::now())?;
            let goal = focus_goal_pct(aggregate.total_focus_minutes, config.focus.daily_goal_min);
            if json {
                print_json(&serde_json::json!({
                    "total_focus_minutes": aggregate.total_focus_minutes,
                    "focus_session_count": aggregate.focus_session_count,
                    "focus_goal_pct": goal,
                }))?;
            } else {
                println!(
                    "{} sessions, {}h {}m focused this week ({goal:.0}% of goal)",
                    aggregate.focus_session_count,
                    aggregate.total_focus_minutes / 60,
                    aggregate.total_focus_minutes % 60,
                );
            }
        }
    }

    save_timer(&db, &timer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_window_rejects_out_of_range_days() {
        assert!(log_window_start(-1).is_err());
        assert!(log_window_start(i64::MAX).is_err());
        assert!(log_window_start(1_000_000_000).is_err());

        let week = log_window_start(7).unwrap();
        let expected = Utc::now() - Duration::days(7);
        assert!((expected - week).num_seconds().abs() < 5);
    }

    #[test]
    fn stored_timer_survives_reload() {
        let db = Database::open_memory().unwrap();
        let config = Config::default();
        let mut timer = FocusTimer::new(40);
        timer.start();
        timer.pause();
        save_timer(&db, &timer).unwrap();

        let loaded = load_timer(&db, &config).unwrap();
        assert_eq!(loaded.state(), TimerState::Paused);
        assert_eq!(loaded.duration_min(), 40);
    }

    #[test]
    fn unreadable_timer_state_resets_to_default() {
        let db = Database::open_memory().unwrap();
        db.kv_set(TIMER_KEY, "{not json").unwrap();
        let loaded = load_timer(&db, &Config::default()).unwrap();
        assert_eq!(loaded.state(), TimerState::Idle);
        assert_eq!(loaded.duration_min(), 25);
    }
}
