mod session;
mod timer;

pub use session::{FocusAggregate, FocusSession, SCORING_WINDOW_DAYS};
pub use timer::{FocusTimer, TimerState, DEFAULT_FOCUS_MINUTES, MAX_FOCUS_MINUTES};
