use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("secret store error: {0}")]
    SecretStore(String),

    #[error("liquibase binary not found on PATH")]
    EngineNotFound,

    #[error("engine error: {0}")]
    Engine(String),

    #[error("operation failed for database '{target}': {source}")]
    TargetOperation {
        target: String,
        #[source]
        source: Box<FleetError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FleetError>;
