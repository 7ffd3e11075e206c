//! Layered error definitions
//!
//! Categorized by source: config / handler / propagation

use thiserror::Error;

use crate::TypeTag;

/// Boxed error returned by handlers and listeners
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type
#[derive(Debug, Error)]
pub enum FluxError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Graph Errors =====
    /// Station name not present in the graph
    #[error("unknown station: {name}")]
    UnknownStation { name: String },

    /// Handler could not be built from configuration
    #[error("cannot build handler '{handler}' for station '{station}': {message}")]
    HandlerBuild {
        station: String,
        handler: String,
        message: String,
    },

    // ===== Propagation Errors =====
    /// A handler returned an error; not isolated by the runtime
    #[error("handler for type '{type_tag}' on station '{station}' failed: {source}")]
    Handler {
        station: String,
        type_tag: TypeTag,
        #[source]
        source: BoxError,
    },

    /// Propagation re-entered stations through a cycle more than the limit allows
    #[error("cycle re-entry limit {depth} exceeded at station '{station}'")]
    DepthExceeded { station: String, depth: usize },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl FluxError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unknown station error
    pub fn unknown_station(name: impl Into<String>) -> Self {
        Self::UnknownStation { name: name.into() }
    }

    /// Create handler build error
    pub fn handler_build(
        station: impl Into<String>,
        handler: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::HandlerBuild {
            station: station.into(),
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Wrap a handler failure
    pub fn handler(station: impl Into<String>, type_tag: TypeTag, source: BoxError) -> Self {
        Self::Handler {
            station: station.into(),
            type_tag,
            source,
        }
    }
}
