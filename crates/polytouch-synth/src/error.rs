//! Error types for polytouch-synth.

use thiserror::Error;

/// Result type alias for polytouch-synth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised at configuration boundaries. The note path never fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] polytouch_core::Error),

    #[error("Invalid pitch multiplier: {0}. Must be finite and positive")]
    InvalidPitchMultiplier(f64),
}
