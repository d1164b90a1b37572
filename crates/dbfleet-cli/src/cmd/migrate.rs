//! Shared driver for all four migration commands: resolve configuration and
//! secrets, build targets, fan the operation out, and record the (redacted)
//! outcome.

use anyhow::Context;
use dbfleet_core::config::FleetConfig;
use dbfleet_core::engine::{self, LiquibaseEngine, MigrationEngine};
use dbfleet_core::logging::{FleetLogger, LogRecord};
use dbfleet_core::orchestrator;
use dbfleet_core::secrets::SecretStore;
use dbfleet_core::target::{OperationKind, TargetBuilder};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub fn run(
    config_path: &Path,
    kind: OperationKind,
    databases: &[String],
    changelog_suffix: &str,
) -> anyhow::Result<()> {
    let config = FleetConfig::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let logger = FleetLogger::open(&config.log_dir, &config.service_name)
        .context("failed to open log sinks")?;

    // One secret fetch per process, before any target building. A failed
    // fetch degrades to an empty store so the run surfaces below as "no
    // databases resolved" instead of crashing.
    let secrets = match SecretStore::load(&config.secrets) {
        Ok(store) => {
            logger.log(LogRecord::info(format!(
                "secrets initialized ({} entries)",
                store.len()
            )))?;
            store
        }
        Err(e) => {
            logger.log(LogRecord::warn(format!("secret store unavailable: {e}")))?;
            SecretStore::empty()
        }
    };

    let builder = TargetBuilder::new(&config, &secrets);
    let targets = builder.build(databases, changelog_suffix, kind)?;
    if targets.is_empty() {
        logger.log(LogRecord::error(
            "no database matched the requested filter; check your command line parameters",
        ))?;
        logger.flush()?;
        return Ok(());
    }

    for target in &targets {
        logger.log(
            LogRecord::info(format!("resolved database '{}'", target.name))
                .with_field("command", json!(engine::render_command_line(kind, target))),
        )?;
    }

    let engine: Arc<dyn MigrationEngine> = match LiquibaseEngine::locate() {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            logger.log(LogRecord::error(e.to_string()))?;
            logger.flush()?;
            return Err(e.into());
        }
    };

    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    let result = runtime.block_on(orchestrator::execute(engine, kind, targets));

    match result {
        Ok(outcomes) => {
            logger.log(
                LogRecord::info(format!(
                    "{kind} completed for {} database(s)",
                    outcomes.len()
                ))
                .with_splat(serde_json::to_value(&outcomes)?),
            )?;
            for outcome in &outcomes {
                println!("{}: {}", outcome.target, outcome.result);
            }
            logger.flush()?;
            Ok(())
        }
        Err(e) => {
            logger.log(LogRecord::error(format!(
                "there was an error processing the databases: {e}"
            )))?;
            logger.flush()?;
            Err(e.into())
        }
    }
}
