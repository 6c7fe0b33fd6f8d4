//! Stereo detune: the left/right oscillator pair of a voice.
//!
//! Proportional detune keeps the interval between the two oscillators
//! constant, so the beat rate grows with pitch. Constant detune keeps the
//! beat rate fixed in Hz regardless of pitch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetuneMode {
    /// `left = f × ratio`, `right = f ÷ ratio`
    #[default]
    Proportional,
    /// `left = f + hz`, `right = f − hz`
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoDetune {
    pub mode: DetuneMode,
    /// Multiplicative offset for proportional mode (1.0 = unison).
    pub ratio: f64,
    /// Additive offset in Hz for constant mode.
    pub hz: f64,
}

impl Default for StereoDetune {
    fn default() -> Self {
        Self {
            mode: DetuneMode::Proportional,
            ratio: 1.0,
            hz: 0.0,
        }
    }
}

impl StereoDetune {
    pub fn proportional(ratio: f64) -> Self {
        Self {
            mode: DetuneMode::Proportional,
            ratio: sanitize_ratio(ratio),
            ..Default::default()
        }
    }

    pub fn constant(hz: f64) -> Self {
        Self {
            mode: DetuneMode::Constant,
            hz: sanitize_hz(hz),
            ..Default::default()
        }
    }

    /// Proportional detune where each side sits `cents` away from the center.
    pub fn from_cents(cents: f64) -> Self {
        Self::proportional((cents.abs() / 1200.0).exp2())
    }

    /// Left and right oscillator frequencies for a center frequency.
    #[inline]
    pub fn split(&self, frequency: f64) -> (f64, f64) {
        match self.mode {
            DetuneMode::Proportional => {
                let ratio = sanitize_ratio(self.ratio);
                (frequency * ratio, frequency / ratio)
            }
            DetuneMode::Constant => {
                let hz = sanitize_hz(self.hz);
                (frequency + hz, frequency - hz)
            }
        }
    }
}

#[inline]
fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.max(1.0)
    } else {
        1.0
    }
}

#[inline]
fn sanitize_hz(hz: f64) -> f64 {
    if hz.is_finite() {
        hz.max(0.0)
    } else {
        0.0
    }
}
