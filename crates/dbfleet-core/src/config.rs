use crate::error::{FleetError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// DatabaseEntry
// ---------------------------------------------------------------------------

/// Static settings for one database in the fleet. Credentials are never
/// stored here — they are resolved from the secret store by `secret_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub name: String,
    pub url: String,
    /// Logical name of this database's secret. Defaults to `name`.
    #[serde(default)]
    pub secret_name: Option<String>,
}

impl DatabaseEntry {
    pub fn secret_name(&self) -> &str {
        self.secret_name.as_deref().unwrap_or(&self.name)
    }
}

// ---------------------------------------------------------------------------
// SecretsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretsMode {
    Local,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default = "default_secrets_mode")]
    pub mode: SecretsMode,
    /// Local mode: path of the secrets JSON file.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Remote mode: URL of the managed secret store endpoint.
    #[serde(default)]
    pub url: Option<String>,
}

fn default_secrets_mode() -> SecretsMode {
    SecretsMode::Local
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            mode: default_secrets_mode(),
            path: None,
            url: None,
        }
    }
}

// ---------------------------------------------------------------------------
// FleetConfig
// ---------------------------------------------------------------------------

/// Root configuration, loaded once from a YAML file at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    pub databases: Vec<DatabaseEntry>,
    /// Connection URL of the reference database that diffs run against.
    pub reference_url: String,
    /// JDBC driver locator handed to the migration engine.
    #[serde(default)]
    pub classpath: Option<String>,
    #[serde(default = "default_changelog_dir")]
    pub changelog_dir: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Logical secret name for the reference database credentials.
    #[serde(default = "default_reference_secret")]
    pub reference_secret: String,
    #[serde(default)]
    pub secrets: SecretsConfig,
}

fn default_changelog_dir() -> String {
    "changelogs".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_service_name() -> String {
    "dbfleet".to_string()
}

fn default_reference_secret() -> String {
    "referenceDb".to_string()
}

impl FleetConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FleetError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config: FleetConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.databases.is_empty() {
            return Err(FleetError::Config(
                "at least one database must be configured".to_string(),
            ));
        }
        match self.secrets.mode {
            SecretsMode::Local if self.secrets.path.is_none() => Err(FleetError::Config(
                "secrets.path is required when secrets.mode is local".to_string(),
            )),
            SecretsMode::Remote if self.secrets.url.is_none() => Err(FleetError::Config(
                "secrets.url is required when secrets.mode is remote".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
