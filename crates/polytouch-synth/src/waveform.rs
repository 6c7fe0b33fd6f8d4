//! LFO waveforms as pure functions of phase.

use core::f64::consts::TAU;
use serde::{Deserialize, Serialize};

/// Low-frequency oscillator shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LfoWaveform {
    #[default]
    Sine,
    Triangle,
    Square,
    /// Rising ramp, snaps down at the end of the cycle.
    Sawtooth,
    /// Falling ramp, snaps up at the end of the cycle.
    ReverseSawtooth,
}

impl LfoWaveform {
    /// Evaluate the waveform at `phase`. Output is bipolar, in [-1, 1].
    ///
    /// Phase is wrapped into [0, 1) first, so unwrapped phases are accepted.
    #[inline]
    pub fn value(self, phase: f64) -> f64 {
        let p = wrap_phase(phase);
        match self {
            LfoWaveform::Sine => (p * TAU).sin(),
            LfoWaveform::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            LfoWaveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoWaveform::Sawtooth => 2.0 * p - 1.0,
            LfoWaveform::ReverseSawtooth => 1.0 - 2.0 * p,
        }
    }
}

/// Wrap any finite phase into [0, 1). Non-finite input maps to 0.
#[inline]
pub fn wrap_phase(phase: f64) -> f64 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase - phase.floor();
    // floor() of values just below an integer can round up to 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
