//! Watch mode: mirror units, push local edits, run on demand

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::app::present;
use crate::app::state::AppState;
use crate::errors::UnitError;
use crate::run::runner::run_unit;
use crate::store::units::print_units;
use crate::sync::reconciler::check_saved;
use crate::watch::classifier::{classify, unit_name};
use crate::watch::watcher::UnitWatcher;

/// Run a full sync with the watcher paused, then re-arm it on the units root.
///
/// A failed sync is reported; the watcher is re-armed either way.
pub async fn sync_paused(state: &AppState, watcher: &mut UnitWatcher) -> Result<(), UnitError> {
    watcher.pause()?;
    let result = state.syncer.sync_units().await;
    watcher.watch(&state.session.path)?;
    match result {
        Ok(count) => println!("{} units in {} are now watched for changes", count, state.session.path.display()),
        Err(e) => present::error(e),
    }
    Ok(())
}

/// React to one file event: push the change and check it was saved.
pub async fn handle_change(state: &AppState, path: &Path) -> Result<(), UnitError> {
    if !state.sync_session.is_actionable(path) {
        return Ok(());
    }
    let Some(changed) = classify(path).await? else {
        return Ok(());
    };
    let Some(unit) = unit_name(path) else {
        return Ok(());
    };

    let _guard = state.sync_session.locks().lock(unit).await;
    present::updating(unit, changed.kind().as_str());
    let response = state.syncer.update_unit(unit, &changed).await?;
    let check = check_saved(&changed, &response);
    present::save_check(unit, &check);
    if check.is_saved() {
        state.set_run_candidate(unit).await;
    }
    Ok(())
}

/// Run `unit` and print its result; returns the log follower
pub async fn run_and_report(state: &AppState, unit: &str) -> Result<Option<JoinHandle<()>>, UnitError> {
    let report = run_unit(&state.syncer, state.api.clone(), unit, present::log_event).await?;
    present::run_outcome(&report);
    Ok(report.logs)
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

async fn handle_command(
    state: &AppState,
    watcher: &mut UnitWatcher,
    line: &str,
) -> Result<Option<JoinHandle<()>>, UnitError> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (None, _) => match state.run_candidate().await {
            Some(unit) => run_and_report(state, &unit).await,
            None => {
                println!("Nothing to run yet, save a unit first");
                Ok(None)
            }
        },
        (Some("run"), Some(unit)) => run_and_report(state, unit).await,
        (Some("sync"), _) => {
            sync_paused(state, watcher).await?;
            Ok(None)
        }
        (Some("ls"), level) => {
            let level = level.and_then(|l| l.parse().ok()).unwrap_or(0);
            println!("{}", print_units(Some(&state.session), level).await?);
            Ok(None)
        }
        _ => {
            println!("Commands: [Enter] run last saved unit, run <unit>, sync, ls [level]");
            Ok(None)
        }
    }
}

/// Sync, then watch the units root until `shutdown_signal` resolves
pub async fn run(
    state: Arc<AppState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), UnitError> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut watcher = UnitWatcher::new(event_tx)?;
    sync_paused(&state, &mut watcher).await?;

    let mut commands = spawn_stdin_reader();
    let mut stdin_open = true;
    let mut log_tasks: Vec<JoinHandle<()>> = Vec::new();
    tokio::pin!(shutdown_signal);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received, shutting down...");
                break;
            }
            Some(event) = event_rx.recv() => {
                debug!("File event: {:?}", event);
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_change(&state, &event.path).await {
                        if e.is_domain() {
                            warn!("Not pushing {}: {}", event.path.display(), e);
                        } else {
                            error!("Failed to push {}: {}", event.path.display(), e);
                        }
                        present::error(&e);
                    }
                });
            }
            line = commands.recv(), if stdin_open => {
                let Some(line) = line else {
                    debug!("stdin closed, commands disabled");
                    stdin_open = false;
                    continue;
                };
                match handle_command(&state, &mut watcher, line.trim()).await {
                    Ok(Some(task)) => log_tasks.push(task),
                    Ok(None) => {}
                    Err(e) => present::error(e),
                }
                log_tasks.retain(|t| !t.is_finished());
            }
        }
    }

    for task in log_tasks {
        task.abort();
    }
    if let Err(e) = watcher.pause() {
        warn!("Failed to stop watcher: {}", e);
    }
    Ok(())
}
