//! Secret resolution.
//!
//! Credentials are loaded exactly once per process, before any target
//! building, and the resulting `SecretStore` is read-only for the rest of
//! the run. Local mode reads a JSON file; remote mode performs one HTTP
//! fetch of the same payload shape:
//!
//! ```json
//! { "allDbSecrets": [ { "name": "...", "username": "...", "password": "..." } ] }
//! ```
//!
//! A failed load is not fatal by itself: callers fall back to
//! `SecretStore::empty()`, where every lookup returns `None`, so the run
//! surfaces as "no databases resolved" instead of crashing mid-flight.

use crate::config::{SecretsConfig, SecretsMode};
use crate::error::{FleetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One logical credential entry from the secret store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub name: String,
    pub username: String,
    pub password: String,
}

/// Payload shape shared by the local file and the remote store body.
#[derive(Debug, Deserialize)]
struct SecretsPayload {
    #[serde(rename = "allDbSecrets")]
    all_db_secrets: Vec<SecretRecord>,
}

#[derive(Debug, Default)]
pub struct SecretStore {
    records: HashMap<String, SecretRecord>,
}

impl SecretStore {
    /// A store with no entries. `lookup` returns `None` for every name.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(config: &SecretsConfig) -> Result<Self> {
        match config.mode {
            SecretsMode::Local => {
                let path = config.path.as_deref().ok_or_else(|| {
                    FleetError::SecretStore("local mode requires secrets.path".to_string())
                })?;
                Self::load_local(path)
            }
            SecretsMode::Remote => {
                let url = config.url.as_deref().ok_or_else(|| {
                    FleetError::SecretStore("remote mode requires secrets.url".to_string())
                })?;
                Self::load_remote(url)
            }
        }
    }

    fn load_local(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FleetError::SecretStore(format!("cannot read {}: {e}", path.display()))
        })?;
        let payload: SecretsPayload = serde_json::from_str(&content).map_err(|e| {
            FleetError::SecretStore(format!("malformed secrets file {}: {e}", path.display()))
        })?;
        Ok(Self::from_payload(payload))
    }

    fn load_remote(url: &str) -> Result<Self> {
        let response = reqwest::blocking::get(url)
            .map_err(|e| FleetError::SecretStore(format!("secret fetch failed: {e}")))?;
        if !response.status().is_success() {
            return Err(FleetError::SecretStore(format!(
                "secret store returned {}",
                response.status()
            )));
        }
        let payload: SecretsPayload = response
            .json()
            .map_err(|e| FleetError::SecretStore(format!("malformed secret payload: {e}")))?;
        Ok(Self::from_payload(payload))
    }

    fn from_payload(payload: SecretsPayload) -> Self {
        let records = payload
            .all_db_secrets
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self { records }
    }

    pub fn lookup(&self, name: &str) -> Option<&SecretRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const PAYLOAD: &str = r#"{
        "allDbSecrets": [
            {"name": "orders", "username": "orders_admin", "password": "pg-1"},
            {"name": "referenceDb", "username": "ref_admin", "password": "pg-ref"}
        ]
    }"#;

    fn local_config(path: PathBuf) -> SecretsConfig {
        SecretsConfig {
            mode: SecretsMode::Local,
            path: Some(path),
            url: None,
        }
    }

    #[test]
    fn local_load_and_lookup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets-dev.json");
        std::fs::write(&path, PAYLOAD).unwrap();

        let store = SecretStore::load(&local_config(path)).unwrap();
        assert_eq!(store.len(), 2);
        let record = store.lookup("orders").unwrap();
        assert_eq!(record.username, "orders_admin");
        assert_eq!(record.password, "pg-1");
        assert!(store.lookup("billing").is_none());
    }

    #[test]
    fn local_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = SecretStore::load(&local_config(dir.path().join("nope.json")));
        assert!(matches!(result, Err(FleetError::SecretStore(_))));
    }

    #[test]
    fn local_malformed_payload_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets-dev.json");
        std::fs::write(&path, "{\"unexpected\": true}").unwrap();
        let result = SecretStore::load(&local_config(path));
        assert!(matches!(result, Err(FleetError::SecretStore(_))));
    }

    #[test]
    fn empty_store_lookup_is_absent() {
        let store = SecretStore::empty();
        assert!(store.is_empty());
        assert!(store.lookup("orders").is_none());
    }

    #[test]
    fn remote_load_and_lookup() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/v1/allDbSecrets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PAYLOAD)
            .create();

        let config = SecretsConfig {
            mode: SecretsMode::Remote,
            path: None,
            url: Some(format!("{}/v1/allDbSecrets", server.url())),
        };
        let store = SecretStore::load(&config).unwrap();
        mock.assert();
        assert_eq!(store.lookup("referenceDb").unwrap().username, "ref_admin");
    }

    #[test]
    fn remote_error_status_fails() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/allDbSecrets")
            .with_status(500)
            .create();

        let config = SecretsConfig {
            mode: SecretsMode::Remote,
            path: None,
            url: Some(format!("{}/v1/allDbSecrets", server.url())),
        };
        let result = SecretStore::load(&config);
        assert!(matches!(result, Err(FleetError::SecretStore(_))));
    }

    #[test]
    fn remote_malformed_body_fails() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/v1/allDbSecrets")
            .with_status(200)
            .with_body("not json")
            .create();

        let config = SecretsConfig {
            mode: SecretsMode::Remote,
            path: None,
            url: Some(format!("{}/v1/allDbSecrets", server.url())),
        };
        let result = SecretStore::load(&config);
        assert!(matches!(result, Err(FleetError::SecretStore(_))));
    }
}
