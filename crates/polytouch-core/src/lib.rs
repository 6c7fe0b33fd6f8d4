//! Shared building blocks for the polytouch voice engine.
//!
//! - [`Error`] / [`Result`]: configuration-boundary errors
//! - [`AtomicDouble`] / [`AtomicFlag`]: cache-line aligned lock-free scalars
//! - [`EngineConfig`]: validated engine configuration
//! - [`ControlClock`]: monotonic fixed-rate control clock

pub mod error;
pub use error::{Error, Result};

mod clock;
pub use clock::{ControlClock, DEFAULT_CONTROL_RATE_HZ, MAX_CONTROL_STEP_SECS};

mod config;
pub use config::{validate_tempo, EngineConfig, DEFAULT_TEMPO, MAX_TEMPO, MAX_VOICES, MIN_TEMPO};

mod lockfree;
pub use lockfree::{AtomicDouble, AtomicFlag};

pub use std::sync::atomic::Ordering;
pub use std::sync::Arc;
