//! Migration engine boundary.
//!
//! The engine is an opaque capability: given a resolved target it performs
//! one operation and returns whatever text it produced, or fails with its
//! own error. The real implementation shells out to the `liquibase` binary.

use crate::error::{FleetError, Result};
use crate::target::{DatabaseTarget, OperationKind};
use std::path::PathBuf;
use std::process::Command;

pub trait MigrationEngine: Send + Sync {
    /// Run one operation against one target. `Ok(None)` means the engine
    /// completed without producing output text.
    fn run(&self, kind: OperationKind, target: &DatabaseTarget) -> Result<Option<String>>;
}

// ---------------------------------------------------------------------------
// LiquibaseEngine
// ---------------------------------------------------------------------------

pub struct LiquibaseEngine {
    bin: PathBuf,
}

impl LiquibaseEngine {
    /// Locate the `liquibase` binary on PATH.
    pub fn locate() -> Result<Self> {
        let bin = which::which("liquibase").map_err(|_| FleetError::EngineNotFound)?;
        Ok(Self { bin })
    }

    pub fn with_binary(bin: PathBuf) -> Self {
        Self { bin }
    }
}

impl MigrationEngine for LiquibaseEngine {
    fn run(&self, kind: OperationKind, target: &DatabaseTarget) -> Result<Option<String>> {
        let output = Command::new(&self.bin)
            .args(render_args(kind, target))
            .output()
            .map_err(|e| FleetError::Engine(format!("failed to launch liquibase: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FleetError::Engine(stderr.trim().to_string()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if stdout.is_empty() { None } else { Some(stdout) })
    }
}

/// CLI verb for one operation kind.
fn subcommand(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Status => "status",
        OperationKind::Apply => "update",
        OperationKind::Diff => "diff-changelog",
        OperationKind::Validate => "validate",
    }
}

/// Render the argument list for one invocation. Pure, so flag construction
/// is testable without a liquibase install.
pub fn render_args(kind: OperationKind, target: &DatabaseTarget) -> Vec<String> {
    let mut args = vec![
        format!("--url={}", target.url),
        format!("--username={}", target.username),
        format!("--password={}", target.password),
        format!("--changelog-file={}", target.changelog_path),
    ];
    if let Some(classpath) = &target.classpath {
        args.push(format!("--classpath={classpath}"));
    }
    if kind == OperationKind::Diff {
        args.push(format!("--reference-url={}", target.reference_url));
        args.push(format!("--reference-username={}", target.reference_username));
        args.push(format!("--reference-password={}", target.reference_password));
    }
    args.push(subcommand(kind).to_string());
    args
}

/// Shell-style rendering of the full invocation, used for debug logging.
/// Carries plaintext credentials — it must only ever be persisted through
/// the redaction pipeline.
pub fn render_command_line(kind: OperationKind, target: &DatabaseTarget) -> String {
    let quoted: Vec<String> = render_args(kind, target)
        .iter()
        .map(|arg| match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => format!("{flag}=\"{value}\""),
            _ => arg.clone(),
        })
        .collect();
    format!("liquibase {}", quoted.join(" "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
