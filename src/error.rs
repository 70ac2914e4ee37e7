use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the JSON configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid argument whitelist pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while publishing findings as a GitHub check run.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("check run request failed: {0}")]
    RequestFailed(String),

    #[error("GitHub API error: {status} - {message}")]
    ApiError { status: u16, message: String },
}
