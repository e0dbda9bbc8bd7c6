//! unitsync - Entry Point
//!
//! Mirrors UnitCluster units to a local folder, watches it and pushes edits
//! back to the server.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use unitsync::app::options::AppOptions;
use unitsync::app::present;
use unitsync::app::run::{run, run_and_report};
use unitsync::app::state::AppState;
use unitsync::errors::UnitError;
use unitsync::filesys::file::File;
use unitsync::logs::{init_logging, LogLevel, LogOptions};
use unitsync::storage::session::{load_session, save_session, Session, SessionOverrides};
use unitsync::store::units::print_units;
use unitsync::utils::version_info;

use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{}", json),
            Err(e) => present::error(e),
        }
        return ExitCode::SUCCESS;
    }

    let options = AppOptions::default();
    let config_file = options.config.config_file();
    let overrides = match overrides_from_args(&cli_args) {
        Ok(overrides) => overrides,
        Err(e) => {
            present::error(e);
            return ExitCode::FAILURE;
        }
    };
    let stored = match load_session(&config_file).await {
        Ok(stored) => stored,
        Err(e) => {
            present::error(e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging before the session is merged and saved
    let log_level = overrides
        .log_level
        .or(stored.as_ref().map(|s| s.log_level))
        .unwrap_or_default();
    let log_options = LogOptions {
        log_level,
        json_format: env::var("UNITSYNC_LOG_FORMAT").is_ok_and(|f| f == "json"),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let session = match resolve_session(stored, &overrides, &config_file).await {
        Ok(session) => session,
        Err(e) => {
            error!("{}", e);
            present::error(e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = session.validate() {
        present::error(e);
        return ExitCode::FAILURE;
    }

    match dispatch(session, &options, &cli_args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            present::error(e);
            ExitCode::FAILURE
        }
    }
}

fn overrides_from_args(cli_args: &HashMap<String, String>) -> Result<SessionOverrides, UnitError> {
    let log_level = cli_args
        .get("loglevel")
        .map(|l| l.parse::<LogLevel>())
        .transpose()
        .map_err(UnitError::ConfigError)?;
    Ok(SessionOverrides {
        dir: cli_args.get("dir").map(PathBuf::from),
        login: cli_args.get("login").cloned(),
        key: cli_args.get("key").cloned(),
        server: cli_args.get("server").cloned(),
        log_level,
    })
}

/// Fold command line overrides into the stored session, saving on change.
///
/// Without a stored session one is created from `--login` and `--key`.
async fn resolve_session(
    stored: Option<Session>,
    overrides: &SessionOverrides,
    config_file: &File,
) -> Result<Session, UnitError> {
    let session = match stored {
        Some(mut session) => {
            debug!("Loaded session of {} from {}", session.login, config_file.path().display());
            if session.merge(overrides) {
                save_session(config_file, &session).await?;
            }
            session
        }
        None if overrides.login.is_some() && overrides.key.is_some() => {
            debug!("No session at {}, creating one", config_file.path().display());
            let session = Session::from_overrides(overrides);
            save_session(config_file, &session).await?;
            session
        }
        None => {
            return Err(UnitError::ConfigError(format!(
                "no session at {}, run with --login=<login> --key=<key>",
                config_file.path().display()
            )));
        }
    };
    Ok(session)
}

/// `--ls` alone lists unit names; `--ls=<n>` picks the depth
fn list_level(flag: &str) -> Result<u32, UnitError> {
    if flag == "true" {
        return Ok(0);
    }
    flag.parse()
        .map_err(|_| UnitError::ConfigError(format!("invalid --ls level {:?}, expected a number", flag)))
}

async fn dispatch(
    session: Session,
    options: &AppOptions,
    cli_args: &HashMap<String, String>,
) -> Result<(), UnitError> {
    if cli_args.contains_key("user") {
        present::session(&session);
        return Ok(());
    }

    let state = Arc::new(AppState::init(session, options).await?);

    if let Some(level) = cli_args.get("ls") {
        let level = list_level(level)?;
        println!("{}", print_units(Some(&state.session), level).await?);
        return Ok(());
    }

    if let Some(name) = cli_args.get("new") {
        let description = cli_args.get("description").map(String::as_str).unwrap_or("");
        let is_public = cli_args.get("public").map(|p| p != "false").unwrap_or(true);
        let path = state.syncer.create_new_unit(name, description, is_public).await?;
        println!("Unit created at {}, you can edit it now", path.display());
        return Ok(());
    }

    if let Some(names) = cli_args.get("remove") {
        let names: Vec<String> = names.split(',').map(|n| n.trim().to_string()).collect();
        let deleted = state.syncer.delete_units(&names).await?;
        println!("Deleted {}", deleted);
        return Ok(());
    }

    if let Some(name) = cli_args.get("run") {
        if let Some(logs) = run_and_report(&state, name).await? {
            tokio::select! {
                _ = logs => info!("End of logs"),
                _ = await_shutdown_signal() => {}
            }
        }
        return Ok(());
    }

    run(state, await_shutdown_signal()).await
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_level() {
        assert_eq!(list_level("true").unwrap(), 0);
        assert_eq!(list_level("2").unwrap(), 2);
        assert!(matches!(list_level("deep"), Err(UnitError::ConfigError(_))));
        assert!(list_level("-1").is_err());
    }

    #[test]
    fn test_loglevel_flag_is_validated() {
        let mut args = HashMap::new();
        args.insert("loglevel".to_string(), "loud".to_string());
        assert!(matches!(overrides_from_args(&args), Err(UnitError::ConfigError(_))));

        args.insert("loglevel".to_string(), "debug".to_string());
        let overrides = overrides_from_args(&args).unwrap();
        assert_eq!(overrides.log_level, Some(LogLevel::Debug));
    }
}
