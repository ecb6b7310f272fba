//! LLM capability error types.

use thiserror::Error;

/// Errors raised while talking to the LLM or interpreting its reply.
#[derive(Error, Debug)]
pub enum AiError {
    /// The client is missing an API key or endpoint.
    #[error("LLM not configured: {0}")]
    NotConfigured(String),

    /// Transport-level failure (DNS, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the credentials.
    #[error("LLM authentication failed: {0}")]
    AuthFailed(String),

    /// The API answered with a non-success status.
    #[error("LLM request failed with HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// The API answered without any text candidate.
    #[error("No response text from LLM")]
    EmptyResponse,

    /// The reply did not contain parseable JSON.
    #[error("Failed to parse LLM response as JSON: {0}")]
    InvalidJson(String),

    /// The JSON parsed but violates the expected value ranges.
    #[error("LLM response violates schema: {0}")]
    SchemaViolation(String),
}

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, AiError>;
