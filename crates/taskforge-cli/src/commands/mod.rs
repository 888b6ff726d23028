pub mod config;
pub mod focus;
pub mod insights;
pub mod task;
pub mod user;

use serde::Serialize;
use taskforge_core::Config;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// The acting user, taken from `user.id` in the config.
pub fn current_user(config: &Config) -> CliResult<String> {
    config
        .user
        .id
        .clone()
        .ok_or_else(|| "no user registered; run `taskforge user register <email>` first".into())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
