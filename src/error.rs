//! Error types for WebQA
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for WebQA operations
///
/// Covers configuration loading, language-model calls, tool execution,
/// web search, and the limits enforced by the reasoning loop.
#[derive(Error, Debug)]
pub enum WebQaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, malformed responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider returned a non-success HTTP status
    #[error("Provider returned HTTP {status}: {body}")]
    ProviderStatus {
        /// HTTP status code returned by the provider
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// Web search errors (search API or page fetch)
    #[error("Search error: {0}")]
    Search(String),

    /// Free-form date strings that could not be understood
    #[error("Date parse error: {0}")]
    DateParse(String),

    /// Missing credentials for an external service
    #[error("Missing credentials for {0}")]
    MissingCredentials(String),

    /// The reasoning loop ran more phases than allowed
    #[error("Recursion limit of {limit} reached without hitting a stop condition")]
    RecursionLimit {
        /// The configured phase limit
        limit: usize,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for WebQA operations
///
/// Uses `anyhow::Error` so call sites can attach context while the
/// typed `WebQaError` stays recoverable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
