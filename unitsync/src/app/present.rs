//! Terminal output for the user

use colored::Colorize;
use tracing::debug;

use crate::run::logs::LogEvent;
use crate::run::runner::{ErrorPosition, RunOutcome, RunReport};
use crate::storage::session::Session;
use crate::sync::reconciler::SaveCheck;

pub fn log_event(event: LogEvent) {
    match event {
        LogEvent::Timestamp(ts) => println!("{}", format!("[ {} ]", ts).green()),
        LogEvent::Line { slot, text } => println!("{} {}", format!("[ {} ] :", slot).green(), text),
        LogEvent::Stats { memory, cpu } => debug!("Unit stats: memory={:?} cpu={:?}", memory, cpu),
    }
}

pub fn run_outcome(report: &RunReport) {
    match &report.outcome {
        RunOutcome::Completed(body) => {
            println!("{} {}", format!("[ {}-result ]", report.unit).green(), body);
        }
        RunOutcome::Failed { message, position } => {
            eprintln!("{} {}", format!("[Module {} error]", report.unit).red(), message);
            match position {
                Some(ErrorPosition::Line(line)) => eprintln!("at line {}", line),
                Some(ErrorPosition::Opaque(position)) => eprintln!("{}", position.red()),
                None => {}
            }
        }
    }
}

pub fn updating(unit: &str, kind: &str) {
    println!("Changes in {} of \"{}\", updating...", kind, unit.bold());
}

pub fn save_check(unit: &str, check: &SaveCheck) {
    match check {
        SaveCheck::Saved => {
            println!("{} Press [Enter] to run unit", format!("\"{}\" saved.", unit).green());
        }
        SaveCheck::NotSaved {
            secret_only: true, ..
        } => {
            println!(
                "{}",
                format!(
                    "\"{}\" updated; secret parameters are not echoed back, so they cannot be confirmed",
                    unit
                )
                .yellow()
            );
        }
        SaveCheck::NotSaved { kind, .. } => {
            eprintln!("{}", format!("{} of \"{}\" not saved", kind.as_str(), unit).red());
        }
    }
}

pub fn error(message: impl std::fmt::Display) {
    eprintln!("{}", message.to_string().red());
}

pub fn session(session: &Session) {
    println!("login:  {}", session.login);
    println!("key:    {}", session.masked_key());
    println!("server: {}", session.server);
    println!("path:   {}", session.path.display());
}
