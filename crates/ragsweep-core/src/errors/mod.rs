//! Error types for the core crate.

use std::path::PathBuf;

/// Fatal input errors raised before any work is dispatched.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Dataset file does not exist.
    #[error("dataset file not found: {}", path.display())]
    DatasetMissing { path: PathBuf },

    /// Dataset file exists but is not a valid `{"items": [...]}` document.
    #[error("failed to parse dataset {}: {message}", path.display())]
    DatasetParse { path: PathBuf, message: String },

    /// Filesystem error while reading or writing an artifact.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Prompt template errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Template references `{name}` but no value was supplied for it.
    #[error("template references unknown placeholder '{name}'")]
    MissingPlaceholder { name: String },

    /// A lone `{` or `}` that is neither a field nor an escape.
    #[error("unbalanced '{brace}' at byte {position} in template")]
    UnbalancedBrace { brace: char, position: usize },

    /// Variant with neither a system nor a user template.
    #[error("prompt variant '{name}' has neither a system nor a user template")]
    EmptyVariant { name: String },

    /// Requested a built-in template that does not exist.
    #[error("unknown prompt template '{name}'")]
    UnknownTemplate { name: String },
}

/// Backend call failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Backend answered with a non-2xx status.
    #[error("{provider} API error (status {status}): {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// Backend answered 2xx but the answer text could not be located.
    #[error("{provider} API response malformed: {detail}")]
    MalformedResponse { provider: String, detail: String },

    /// Credentials were not found in the configured environment variable.
    #[error("{provider} API key not set (expected in ${env})")]
    MissingApiKey { provider: String, env: String },
}

/// Answer extraction failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    /// The answer marker is the last thing in the response, so there is no
    /// character to return after it.
    #[error("string index out of range: answer marker '{marker}' ends the response")]
    MarkerAtEnd { marker: String },
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid config: {0}")]
    Invalid(String),
}
