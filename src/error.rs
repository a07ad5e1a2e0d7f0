//! Error types for the scope layer.

use crate::types::{RevisionId, RevisionMode};
use thiserror::Error;

/// Main error type for scope operations.
///
/// Clone-able so that a single failed revision refresh can be handed to
/// every caller awaiting the same in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("no branch context configured on this client")]
    ContextNotSet,

    #[error("operation requires a draft revision, scope is {mode}")]
    NotDraft { mode: RevisionMode },

    #[error("scope has been disposed")]
    Disposed,

    #[error("unknown revision: {0}")]
    UnknownRevision(RevisionId),

    #[error("remote operation failed: {message}")]
    Transport {
        /// Status code, when the server supplied one.
        status: Option<u16>,
        message: String,
    },
}

impl ClientError {
    /// Wrap a remote failure that carries no status code.
    pub fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Wrap a remote failure with a server status code.
    pub fn transport_with_status(status: u16, message: impl Into<String>) -> Self {
        ClientError::Transport {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// Result type for scope operations.
pub type Result<T> = std::result::Result<T, ClientError>;
