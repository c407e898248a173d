//! Application error types

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Settings Backend Errors
    // ─────────────────────────────────────────────────────────────
    /// The settings backend could not be reached or gave a bad answer.
    ///
    /// Fatal at startup; mid-run the triggering operation is abandoned
    /// and the next poll converges once the backend returns.
    #[error("settings backend unavailable: {reason}")]
    Backend { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Session Bus Errors
    // ─────────────────────────────────────────────────────────────
    #[error("session bus error: {message}")]
    Bus { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }

    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus {
            message: message.into(),
        }
    }

    /// Backend errors are recoverable mid-run; everything else is not
    /// expected to clear on its own.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Backend { .. })
    }
}
