//! Concurrent fan-out of one operation across all resolved targets.
//!
//! Aggregation is fail-together, not fail-fast: every task is started
//! before any is joined, a sibling's failure never cancels tasks that are
//! already running, and only after all tasks have finished does the
//! aggregate decide success or failure. On failure the collected successes
//! are discarded by the caller; the error carries the failing target's name
//! and the engine's original error.

use crate::engine::MigrationEngine;
use crate::error::{FleetError, Result};
use crate::target::{DatabaseTarget, OperationKind};
use serde::Serialize;
use std::sync::Arc;

/// Result of one target's operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    pub target: String,
    pub result: String,
}

/// Substituted when the engine completes without output text.
pub const OK_RESULT: &str = "OK";

pub async fn execute(
    engine: Arc<dyn MigrationEngine>,
    kind: OperationKind,
    targets: Vec<DatabaseTarget>,
) -> Result<Vec<OperationOutcome>> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let mut handles = Vec::with_capacity(targets.len());
    for target in targets {
        let engine = Arc::clone(&engine);
        let name = target.name.clone();
        let handle = tokio::task::spawn_blocking(move || {
            engine.run(kind, &target).map(|text| OperationOutcome {
                target: target.name.clone(),
                result: text.unwrap_or_else(|| OK_RESULT.to_string()),
            })
        });
        handles.push((name, handle));
    }

    // Join every handle regardless of individual failures, then inspect.
    let mut outcomes = Vec::with_capacity(handles.len());
    let mut first_failure: Option<FleetError> = None;
    for (name, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(FleetError::Engine(format!("task panicked: {e}"))),
        };
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                if first_failure.is_none() {
                    first_failure = Some(FleetError::TargetOperation {
                        target: name,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(outcomes),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
