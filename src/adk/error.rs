// SPDX-License-Identifier: MIT

//! Typed error handling for arxiv-researcher
//!
//! Every collaborator (model, search, store) reports failures through
//! [`ResearchError`] so the workflow can propagate them with `?` unchanged.

use thiserror::Error;

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ResearchError>;

/// Top-level error type for arxiv-researcher
#[derive(Debug, Error)]
pub enum ResearchError {
    /// API errors from external services (Gemini, Tavily)
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// Configuration errors (missing env vars, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model/LLM-specific errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// History or memory store errors
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    /// Full-text index errors from memory search
    #[error("Index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Response blocked by the provider
    #[error("Response blocked by {provider}: {reason}")]
    Blocked { provider: String, reason: String },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),
}

impl ResearchError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

// redb reports each transaction stage with its own error type
macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ResearchError {
                fn from(err: $ty) -> Self {
                    Self::Storage(redb::Error::from(err))
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<String> for ResearchError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for ResearchError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
