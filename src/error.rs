//! Error taxonomy. Library-boundary errors are explicit enums so callers
//! can match on a specific failure; the supervisor and `main` glue
//! propagate them through `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("received a zero-length frame from the audit socket")]
    ZeroLengthFrame,
    #[error("audit socket error: {0}")]
    SocketError(#[from] std::io::Error),
    #[error("shutdown requested")]
    ShutdownRequested,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid filter {index}: {reason}")]
    InvalidFilter { index: usize, reason: String },
    #[error("no outputs were configured")]
    NoOutputConfigured,
    #[error("only one output can be enabled at a time, found: {0:?}")]
    MultipleOutputsConfigured(Vec<&'static str>),
    #[error("output `{transport}` requires `attempts` >= 1, got {attempts}")]
    InvalidAttempts { transport: &'static str, attempts: i64 },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("http sink returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("sink exhausted all {attempts} attempt(s)")]
    Exhausted { attempts: u32 },
    #[error("failed to open sink: {0}")]
    Open(String),
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to flush existing audit rules: {0}")]
    Flush(std::io::Error),
    #[error("failed to add rule #{index}: {source}")]
    AddRule { index: usize, source: std::io::Error },
    #[error("no audit rules found in configuration")]
    NoRulesConfigured,
}
