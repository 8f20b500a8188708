//! Error types for routing.

use thiserror::Error;

/// Error type handlers return to abort a dispatch chain.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Router-specific errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No route matched the URL.
    #[error("No matching route: {url}")]
    NoMatch { url: String },

    /// A handler signalled failure and the chain was aborted.
    #[error("handler {index} failed: {source}")]
    Handler {
        /// Position of the failing handler in the chain.
        index: usize,
        /// The error exactly as the handler returned it.
        #[source]
        source: BoxError,
    },

    /// Route declarations are missing required fields.
    #[error("misconfigured routes: {0}")]
    MisconfiguredRoute(String),

    /// A pattern could not be compiled.
    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Malformed percent-encoding in a URL component.
    #[error("cannot decode `{input}`: {reason}")]
    Decode { input: String, reason: String },

    /// A dispatch chain was executed after it already settled.
    #[error("dispatch chain already executed")]
    ChainSpent,

    /// A route manifest is structurally invalid.
    #[error("invalid route manifest: {0}")]
    Manifest(String),

    /// IO error (reading a manifest file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RouterError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the handler's own error if this is a handler failure.
    pub fn handler_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Handler { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
