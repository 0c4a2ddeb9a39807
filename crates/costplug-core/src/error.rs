//! Error types for costplug-core.
//!
//! Contract errors travel back to the caller exactly as the service produced
//! them, so they are `Clone` and comparable.

use std::time::Duration;

use crate::types::Method;

/// Result type alias for contract calls.
pub type Result<T> = std::result::Result<T, ContractError>;

/// Errors a cost-source call can produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// The method is not implemented by this plugin.
    #[error("{method} is not implemented")]
    Unimplemented {
        /// The method that was called.
        method: Method,
    },

    /// The request failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The plugin cannot serve the call right now.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The caller's deadline elapsed before a reply arrived.
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// The call was abandoned before completion.
    #[error("call cancelled")]
    Cancelled,

    /// The in-memory transport failed to deliver the call or its reply.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other plugin-side failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ContractError {
    /// Creates an unimplemented error for `method`.
    #[must_use]
    pub const fn unimplemented(method: Method) -> Self {
        Self::Unimplemented { method }
    }

    /// Creates an invalid-argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if the plugin reported the method as not implemented.
    ///
    /// Optional capabilities answer this way; callers treat it as absence,
    /// not failure.
    #[must_use]
    pub const fn is_unimplemented(&self) -> bool {
        matches!(self, Self::Unimplemented { .. })
    }

    /// Returns true if the error came from the transport or the caller's
    /// own deadline rather than from the plugin.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::DeadlineExceeded(_) | Self::Cancelled
        )
    }
}

/// Errors raised while establishing the in-memory transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Channel capacity must be at least one.
    #[error("transport buffer must be at least 1, got {0}")]
    InvalidBuffer(usize),

    /// No tokio runtime is available to host the server.
    #[error("no async runtime available: {0}")]
    NoRuntime(String),
}
