//! Local identity. Registered users can be named as share targets by email.

use chrono::Utc;
use clap::Subcommand;
use taskforge_core::{Config, Database};

use super::{current_user, print_json, CliResult};

#[derive(Subcommand)]
pub enum UserAction {
    /// Register an email and make it the acting user
    Register {
        /// Email address
        email: String,
        /// Register without switching the acting user
        #[arg(long)]
        no_switch: bool,
    },
    /// Switch the acting user to an already registered email
    Switch {
        /// Email address
        email: String,
    },
    /// Print the acting user
    Whoami,
}

fn use_identity(config: &mut Config, uid: &str, email: &str) -> CliResult {
    config.set("user.id", uid)?;
    config.set("user.email", email)?;
    config.save()?;
    Ok(())
}

pub fn run(action: UserAction) -> CliResult {
    let mut config = Config::load()?;
    let db = Database::open()?;

    match action {
        UserAction::Register { email, no_switch } => {
            let user = db.register_user(&email, Utc::now())?;
            if !no_switch {
                use_identity(&mut config, &user.uid, &user.email)?;
            }
            println!("User registered: {}", user.uid);
            print_json(&user)?;
        }
        UserAction::Switch { email } => {
            let user = db
                .find_user_by_email(&email)?
                .ok_or_else(|| taskforge_core::CoreError::user_not_found(&email))?;
            use_identity(&mut config, &user.uid, &user.email)?;
            println!("Now acting as {}", user.email);
        }
        UserAction::Whoami => {
            let uid = current_user(&config)?;
            let user = db
                .get_user(&uid)?
                .ok_or_else(|| taskforge_core::CoreError::user_not_found(&uid))?;
            print_json(&user)?;
        }
    }
    Ok(())
}
