use crate::{Cli, CliError, CliResult, Commands, logger};

use acct_config::Config;
use acct_core::{Monitor, StoreLayout, SwapEngine};

use std::io::IsTerminal;
use std::time::Duration;

use log::{info, warn};
use serde_json::{Value, json};

/// Full startup: config, logger, one-time migration, then the command.
pub async fn run(cli: &Cli) -> CliResult<Value> {
    let config = match &cli.config_dir {
        Some(dir) => Config::load_in(dir)?,
        None => Config::load()?,
    };
    config.validate()?;

    logger::initialize(
        config.logging.level,
        config.log_file_path(),
        config.logging.colored && std::io::stderr().is_terminal(),
    )?;
    config.log_summary();

    let engine = SwapEngine::new(layout_from_config(&config)?).with_lock(config.swap.use_lock);
    if cli.command != Commands::Migrate {
        startup_migration(&engine);
    }

    execute(&engine, &cli.command, config.monitor.poll_interval()).await
}

pub fn layout_from_config(config: &Config) -> CliResult<StoreLayout> {
    Ok(StoreLayout::new(
        config.paths.credential_file_path()?,
        config.paths.config_file_path()?,
        config.paths.fallback_config_file_path()?,
        config.paths.backup_dir_path()?,
    ))
}

/// Runs one command against `engine` and returns its JSON result.
pub async fn execute(
    engine: &SwapEngine,
    command: &Commands,
    poll_interval: Duration,
) -> CliResult<Value> {
    let value = match command {
        Commands::Save => {
            let outcome = engine.save_current()?;
            json!({ "account": outcome.value, "warnings": outcome.non_fatal })
        }
        Commands::Switch { account } => {
            let outcome = engine.switch_to(*account)?;
            json!({ "switch": outcome.value, "warnings": outcome.non_fatal })
        }
        Commands::List => json!({ "accounts": engine.list_accounts()? }),
        Commands::Status => to_value(&engine.status()?)?,
        Commands::Debug => to_value(&engine.debug_snapshot()?)?,
        Commands::Migrate => {
            let outcome = engine.migrate()?;
            json!({ "renamed": outcome.value.renamed, "warnings": outcome.non_fatal })
        }
        Commands::Cleanup => {
            let outcome = engine.cleanup_orphans()?;
            json!({
                "removed": outcome.value.removed,
                "held_back_by": outcome.value.held_back_by,
                "warnings": outcome.non_fatal
            })
        }
        Commands::Watch => watch(engine, poll_interval).await?,
    };
    Ok(value)
}

pub fn render(value: &Value, pretty: bool) -> CliResult<String> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    output.map_err(CliError::output)
}

/// Two-line stderr message: the error, then what to do about it.
pub fn render_error(error: &CliError) -> String {
    format!("Error: {error}\nHint: {}", error.recovery_hint())
}

/// Migration failures never stop startup; a missed rename reads as absent.
fn startup_migration(engine: &SwapEngine) {
    match engine.migrate() {
        Ok(outcome) if !outcome.value.renamed.is_empty() => {
            info!(
                "Startup migration renamed {} backup file(s)",
                outcome.value.renamed.len()
            );
        }
        Ok(_) => {}
        Err(e) => warn!("Startup migration skipped: {e}"),
    }
}

/// Prints one JSON line per refresh until Ctrl-C.
async fn watch(engine: &SwapEngine, poll_interval: Duration) -> CliResult<Value> {
    let monitor = Monitor::new(engine.clone(), poll_interval);
    let mut snapshots = monitor.subscribe();
    monitor.start().await;
    info!("Watching every {}s; press Ctrl-C to stop", poll_interval.as_secs());

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    let signal_result = loop {
        tokio::select! {
            result = &mut interrupted => break result,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let line = snapshots
                    .borrow_and_update()
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()
                    .map_err(CliError::output)?;
                if let Some(line) = line {
                    println!("{line}");
                }
            }
        }
    };

    let state = monitor.stop().await;
    signal_result.map_err(CliError::signal)?;

    let last = snapshots.borrow().clone();
    Ok(json!({ "state": state, "last_snapshot": last }))
}

fn to_value<T: serde::Serialize>(value: &T) -> CliResult<Value> {
    serde_json::to_value(value).map_err(CliError::output)
}
