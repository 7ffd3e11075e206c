//! Dispatcher error types

use thiserror::Error;

use crate::report::DispatchReport;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Listener creation error
    #[error("failed to create listener '{name}': {message}")]
    ListenerCreation { name: String, message: String },

    /// One or more listeners failed during a dispatch
    #[error("{failed} listener(s) failed during dispatch")]
    ListenerFailures {
        failed: usize,
        report: DispatchReport,
    },

    /// Contract error
    #[error("contract error: {0}")]
    Contract(#[from] contracts::FluxError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a listener creation error
    pub fn listener_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ListenerCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
