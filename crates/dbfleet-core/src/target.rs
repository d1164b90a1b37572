//! Target resolution: merge static database settings with resolved secrets
//! into immutable `DatabaseTarget` values, one per database the caller asked
//! for.

use crate::config::FleetConfig;
use crate::error::{FleetError, Result};
use crate::secrets::SecretStore;
use serde::Serialize;

/// Filter sentinel that bypasses name matching.
pub const ALL_DATABASES: &str = "all";

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Status,
    Apply,
    Diff,
    Validate,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Status => write!(f, "status"),
            OperationKind::Apply => write!(f, "apply"),
            OperationKind::Diff => write!(f, "diff"),
            OperationKind::Validate => write!(f, "validate"),
        }
    }
}

// ---------------------------------------------------------------------------
// DatabaseTarget
// ---------------------------------------------------------------------------

/// One fully resolved database, ready to hand to the migration engine.
/// Built fresh per invocation and never mutated afterwards.
///
/// Serializable so targets can travel inside log records — anything logged
/// goes through the redaction pipeline before persistence.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseTarget {
    pub name: String,
    pub url: String,
    pub changelog_path: String,
    pub classpath: Option<String>,
    pub username: String,
    pub password: String,
    pub reference_url: String,
    pub reference_username: String,
    pub reference_password: String,
}

// ---------------------------------------------------------------------------
// TargetBuilder
// ---------------------------------------------------------------------------

/// Builds targets from config plus an already-initialized secret store.
/// Taking the store by reference enforces the ordering invariant: no builder
/// can exist before secrets have been loaded (or deliberately degraded to
/// `SecretStore::empty()`).
pub struct TargetBuilder<'a> {
    config: &'a FleetConfig,
    secrets: &'a SecretStore,
}

impl<'a> TargetBuilder<'a> {
    pub fn new(config: &'a FleetConfig, secrets: &'a SecretStore) -> Self {
        Self { config, secrets }
    }

    /// Resolve every configured database matching `filter` into a target.
    ///
    /// An empty result is not an error: databases with no resolvable secret
    /// are skipped with a warning, and callers treat zero targets as a
    /// logged no-op run.
    pub fn build(
        &self,
        filter: &[String],
        changelog_suffix: &str,
        kind: OperationKind,
    ) -> Result<Vec<DatabaseTarget>> {
        if changelog_suffix.trim().is_empty() {
            return Err(FleetError::Config(
                "changelog suffix must not be empty".to_string(),
            ));
        }

        let Some(reference) = self.secrets.lookup(&self.config.reference_secret) else {
            tracing::warn!(
                secret = %self.config.reference_secret,
                "reference database secret not found, no targets can be resolved"
            );
            return Ok(Vec::new());
        };

        let mut targets = Vec::new();
        for entry in &self.config.databases {
            if !matches_filter(filter, &entry.name) {
                continue;
            }
            let Some(secret) = self.secrets.lookup(entry.secret_name()) else {
                tracing::warn!(
                    database = %entry.name,
                    secret = %entry.secret_name(),
                    "no secret found for database, skipping"
                );
                continue;
            };
            targets.push(DatabaseTarget {
                name: entry.name.clone(),
                url: entry.url.clone(),
                changelog_path: self.changelog_path(&entry.name, changelog_suffix, kind),
                classpath: self.config.classpath.clone(),
                username: secret.username.clone(),
                password: secret.password.clone(),
                reference_url: self.config.reference_url.clone(),
                reference_username: reference.username.clone(),
                reference_password: reference.password.clone(),
            });
        }
        Ok(targets)
    }

    /// `<dir>/<name>_changelog_<suffix>.yaml`, with a `_diff` marker for
    /// diff runs so their output never collides with other operations'.
    fn changelog_path(&self, name: &str, suffix: &str, kind: OperationKind) -> String {
        let marker = if kind == OperationKind::Diff { "_diff" } else { "" };
        format!(
            "{}/{}_changelog_{}{}.yaml",
            self.config.changelog_dir, name, suffix, marker
        )
    }
}

fn matches_filter(filter: &[String], name: &str) -> bool {
    filter
        .iter()
        .any(|f| f == ALL_DATABASES || f.eq_ignore_ascii_case(name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
