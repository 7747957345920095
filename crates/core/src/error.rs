//! Error types for U-Placement.

use thiserror::Error;

/// Result type alias for U-Placement operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running a placement pass.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid sampler configuration (side selector, region count, axis, reference shape).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The object is already registered in this sampler tree or already placed in this pass.
    #[error("Object '{0}' is already registered or placed")]
    DuplicateObject(String),

    /// A reference or exclusion name is not present in the placement table.
    #[error("Invalid reference '{name}', current options are: {valid:?}")]
    InvalidReference {
        /// The requested name.
        name: String,
        /// Names present in the placement table at the time of the request.
        valid: Vec<String>,
    },

    /// The retry budget was exhausted for one object.
    #[error("Cannot place object '{object}' in sampler '{sampler}' after {attempts} attempts")]
    PlacementExhausted {
        /// The object that could not be placed.
        object: String,
        /// The sampler that gave up.
        sampler: String,
        /// Number of attempts made.
        attempts: usize,
    },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true for the retryable exhaustion signal.
    ///
    /// A caller that sees this may rerun the whole pass with a fresh draw.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::PlacementExhausted { .. })
    }

    /// Returns true if rerunning the pass cannot help.
    pub fn is_fatal(&self) -> bool {
        !self.is_exhausted()
    }
}
