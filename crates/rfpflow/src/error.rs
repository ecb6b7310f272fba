use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RfpflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Email error: {0}")]
    Email(#[from] crate::email::EmailError),

    #[error("LLM error: {0}")]
    Ai(#[from] crate::ai::AiError),

    #[error("Proposal error: {0}")]
    Proposal(#[from] crate::proposal::ProposalError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, RfpflowError>;
