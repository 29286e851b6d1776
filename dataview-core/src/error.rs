//! Error types for dataview.
//!
//! One error enum shared by every crate in the workspace. It is `Clone` because a
//! single loader outcome is handed to every caller coalesced onto the same key.

use thiserror::Error;

/// Result type alias using `DataviewError`.
pub type Result<T> = std::result::Result<T, DataviewError>;

/// Main error type for all dataview operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataviewError {
    // ═══════════════════════════════════════════════════════════════════════════
    // LOADER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The injected loader failed. Propagated verbatim to every waiting caller.
    #[error("Loader failed for '{key}': {message}")]
    LoaderFailed {
        /// Cache key the load was for
        key: String,
        /// The loader's error, rendered with `Display`
        message: String,
    },

    /// A bulk loader response did not contain the requested key.
    #[error("Bulk response did not cover key '{0}'")]
    MissingBulkKey(String),

    /// The request was aborted through its cancellation token.
    ///
    /// Never surfaced as a visible error state.
    #[error("Request cancelled")]
    Cancelled,

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Virtualization geometry is unusable (non-positive row height, NaN, ...).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation, e.g. a loader task panicked.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DataviewError {
    /// Builds a loader failure for `key` from any displayable error.
    pub fn loader(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        DataviewError::LoaderFailed {
            key: key.into(),
            message: err.to_string(),
        }
    }

    /// Returns true if this error represents an abort rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DataviewError::Cancelled)
    }

    /// Returns true if this error is recoverable (the next call may succeed).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DataviewError::LoaderFailed { .. }
                | DataviewError::MissingBulkKey(_)
                | DataviewError::InternalError(_)
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            DataviewError::InvalidGeometry(_) | DataviewError::ConfigError(_)
        )
    }
}
