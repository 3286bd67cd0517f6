//! Error types for the rule engine.

use thiserror::Error;

/// Errors raised while loading or running a rule.
///
/// None of these ever reach the proxy host from a hook: hooks log them and
/// fall back to pass-through.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid url pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid request url `{0}`")]
    InvalidUrl(String),

    #[error("malformed data uri: {0}")]
    InvalidDataUri(String),

    #[error("failed to decode {encoding} response body: {source}")]
    Decode {
        encoding: String,
        #[source]
        source: std::io::Error,
    },

    #[error("side-channel report to {url} failed: {source}")]
    ReportDelivery {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid rule configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type RuleResult<T> = Result<T, RuleError>;
