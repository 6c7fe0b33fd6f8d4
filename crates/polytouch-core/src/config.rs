//! Engine configuration.

use crate::clock::DEFAULT_CONTROL_RATE_HZ;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Slowest accepted tempo in BPM.
pub const MIN_TEMPO: f64 = 20.0;

/// Fastest accepted tempo in BPM.
pub const MAX_TEMPO: f64 = 999.0;

/// Tempo used until the host sets one.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Upper bound on the fixed voice pool size.
pub const MAX_VOICES: usize = 64;

/// Configuration for the modulation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of voices in the pool, fixed for the pool's lifetime.
    pub voice_count: usize,
    /// Control-loop tick rate in Hz.
    pub control_rate_hz: f64,
    /// Initial tempo in BPM.
    pub tempo: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            voice_count: 5,
            control_rate_hz: DEFAULT_CONTROL_RATE_HZ,
            tempo: DEFAULT_TEMPO,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.voice_count == 0 || self.voice_count > MAX_VOICES {
            return Err(Error::InvalidVoiceCount(self.voice_count));
        }
        if !(10.0..=2000.0).contains(&self.control_rate_hz) {
            return Err(Error::InvalidControlRate(self.control_rate_hz));
        }
        validate_tempo(self.tempo)?;
        Ok(())
    }
}

/// Returns the tempo unchanged if it is inside the accepted BPM range.
pub fn validate_tempo(bpm: f64) -> Result<f64> {
    if !bpm.is_finite() || !(MIN_TEMPO..=MAX_TEMPO).contains(&bpm) {
        return Err(Error::InvalidTempo(bpm));
    }
    Ok(bpm)
}
