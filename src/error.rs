//! Error types for config and contract loading.
//!
//! All of these are startup errors: a server is never started from a
//! partially loaded table.

use std::path::PathBuf;

/// Errors raised while importing or exporting a mock config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse config: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Unable to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Invalid status code '{code}' for path {path}")]
    InvalidStatus { path: String, code: String },
    #[error("Status code {status} is listed more than once for path {path}")]
    DuplicateStatus { path: String, status: u16 },
    #[error("Method '{method}' is listed more than once for path {path}")]
    DuplicateMethod { path: String, method: String },
    #[error("Method '{method}' of path {path} has no responses")]
    MissingResponses { path: String, method: String },
}

/// Errors raised while converting a contract into a response table.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Unable to read contract {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse contract as JSON ({json}) or YAML ({yaml})")]
    Parse {
        json: serde_json::Error,
        yaml: serde_yaml::Error,
    },
    #[error("Invalid contract: {0}")]
    Invalid(String),
}
