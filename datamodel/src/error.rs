//! Error types for data-model bundle operations.
//!
//! Provides a unified error type covering bundle loading, configuration
//! parsing, and provider calls.

use thiserror::Error;

/// Errors that can occur while loading bundles or configuration.
#[derive(Debug, Error)]
pub enum DataModelError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A provider call failed; the category is left empty by the collector.
    #[error("collaborator call failed for {category}: {detail}")]
    ProviderFailure { category: &'static str, detail: String },
}

/// Convenience alias for results with [`DataModelError`].
pub type Result<T> = std::result::Result<T, DataModelError>;
