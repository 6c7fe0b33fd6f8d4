//! Error types for polytouch-core.

use thiserror::Error;

/// Error type for polytouch-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid tempo: {0}. Must be between 20.0 and 999.0 BPM")]
    InvalidTempo(f64),

    #[error("Invalid control rate: {0} Hz. Must be between 10.0 and 2000.0 Hz")]
    InvalidControlRate(f64),

    #[error("Invalid voice count: {0}. Must be between 1 and 64")]
    InvalidVoiceCount(usize),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
