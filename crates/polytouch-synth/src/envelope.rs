//! ADSR evaluation for modulation envelopes.
//!
//! These envelopes drive parameters rather than amplitude, and are evaluated
//! as pure functions of the time since the last gate transition. The caller
//! owns the clock (see [`ModulationState`](crate::ModulationState)).
//!
//! ```text
//!   1.0 ┐   /\
//!       │  /  \_________
//!   S   │ /             \        release starts from the level the
//!       │/               \       envelope actually had when the gate
//!   0.0 └─────────────────\──    closed, not from S
//!        A   D     S       R
//! ```

use serde::{Deserialize, Serialize};

/// Stage of a modulation envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    Idle,
}

/// ADSR shape (times in seconds, sustain 0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdsrShape {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for AdsrShape {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

impl AdsrShape {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
        }
    }

    /// Stage reached `t` seconds after the gate opened (or closed, if `!gate_open`).
    pub fn stage(&self, t: f64, gate_open: bool) -> EnvelopeStage {
        if gate_open {
            if t < self.attack {
                EnvelopeStage::Attack
            } else if t < self.attack + self.decay {
                EnvelopeStage::Decay
            } else {
                EnvelopeStage::Sustain
            }
        } else if t < self.release {
            EnvelopeStage::Release
        } else {
            EnvelopeStage::Idle
        }
    }

    /// Level `t` seconds after the gate opened.
    ///
    /// Zero-length stages are skipped, so no division by zero can occur.
    #[inline]
    pub fn open_value(&self, t: f64) -> f64 {
        let t = t.max(0.0);
        if t < self.attack {
            t / self.attack
        } else if t < self.attack + self.decay {
            1.0 - ((t - self.attack) / self.decay) * (1.0 - self.sustain)
        } else {
            self.sustain
        }
    }

    /// Level `t` seconds after the gate closed, starting from `captured`.
    #[inline]
    pub fn release_value(&self, t: f64, captured: f64) -> f64 {
        let t = t.max(0.0);
        if t < self.release {
            captured * (1.0 - t / self.release)
        } else {
            0.0
        }
    }

    /// Level for either gate state.
    #[inline]
    pub fn value(&self, t: f64, gate_open: bool, captured: f64) -> f64 {
        if gate_open {
            self.open_value(t)
        } else {
            self.release_value(t, captured)
        }
    }
}
