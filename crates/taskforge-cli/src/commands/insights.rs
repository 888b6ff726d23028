use chrono::Utc;
use clap::Subcommand;
use taskforge_core::insights::score_breakdown;
use taskforge_core::{Config, Database, InsightsFeed, InsightsReport, TaskStore};

use super::{current_user, print_json, CliResult};

#[derive(Subcommand)]
pub enum InsightsAction {
    /// Weekly productivity report
    Show {
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print only the weekly score (0-100)
    Score,
}

fn build_report(config: &Config) -> CliResult<InsightsReport> {
    let user = current_user(config)?;
    let db = Database::open()?;
    let now = Utc::now();

    let aggregate = db.focus_aggregate(now)?;
    let tasks = db.list_tasks_for(&user)?;
    let mut store = TaskStore::with_tasks(user, tasks);
    let feed = InsightsFeed::attach(&mut store, aggregate, now.date_naive());
    let metrics = feed.latest();
    let breakdown = score_breakdown(store.tasks(), aggregate.total_focus_minutes);
    feed.detach(&mut store);

    Ok(InsightsReport::new(metrics, breakdown, config.focus.daily_goal_min))
}

pub fn run(action: InsightsAction) -> CliResult {
    let config = Config::load()?;
    let report = build_report(&config)?;

    match action {
        InsightsAction::Show { json: true } => print_json(&report)?,
        InsightsAction::Show { json: false } => {
            let m = &report.metrics;
            let b = &report.breakdown;
            println!("Weekly score: {}/100 ({})", m.weekly_score, report.rating.label());
            println!(
                "  priority completion {:.1}/60, focus {:.1}/25, momentum {}/15",
                b.priority_completion, b.focus_adequacy, b.momentum
            );
            println!(
                "Tasks: {}/{} completed ({:.0}%)",
                m.tasks_completed,
                m.tasks_added,
                m.completion_ratio * 100.0
            );
            println!(
                "Focus: {} min over {} sessions (avg {:.0} min), {:.0}% of goal",
                m.total_focus_time, m.focus_sessions, m.average_session_length, report.focus_goal_pct
            );
            println!("Streak: {} day(s)", m.streak);
            if config.insights.show_suggestions && !report.suggestions.is_empty() {
                println!();
                for suggestion in &report.suggestions {
                    println!("- {}", suggestion.message());
                }
            }
        }
        InsightsAction::Score => println!("{}", report.metrics.weekly_score),
    }
    Ok(())
}
