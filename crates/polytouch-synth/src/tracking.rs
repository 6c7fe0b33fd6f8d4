//! Key tracking and touch contributions.
//!
//! Key tracking maps note frequency logarithmically onto [0, 1] with A4
//! (440 Hz) pinned at 0.5 and six octaves spanning the whole range.

use crate::params::{KeyTrackingParameters, TouchParameters};

/// Frequency pinned to the center of the key-tracking range.
pub const KEY_TRACKING_CENTER_HZ: f64 = 440.0;

/// Octaves covered by the full key-tracking range.
pub const KEY_TRACKING_OCTAVES: f64 = 6.0;

/// Normalized key-tracking value for a note frequency.
///
/// Non-positive or non-finite frequencies map to the center.
#[inline]
pub fn key_tracking_value(frequency: f64) -> f64 {
    if !frequency.is_finite() || frequency <= 0.0 {
        return 0.5;
    }
    (0.5 + (frequency / KEY_TRACKING_CENTER_HZ).log2() / KEY_TRACKING_OCTAVES).clamp(0.0, 1.0)
}

impl KeyTrackingParameters {
    /// Filter cutoff contribution in octaves. An amount of 1.0 makes the
    /// cutoff follow the note pitch exactly inside the tracked range.
    #[inline]
    pub fn filter_octaves(&self, tracking: f64) -> f64 {
        self.filter_amount * KEY_TRACKING_OCTAVES * (tracking - 0.5)
    }

    /// Per-voice LFO rate contribution in Hz (bipolar around A4).
    #[inline]
    pub fn lfo_rate_hz(&self, tracking: f64) -> f64 {
        self.lfo_rate_amount * 2.0 * (tracking - 0.5)
    }
}

/// Touch position captured at note-on plus its live value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchReading {
    pub initial: f64,
    pub current: f64,
}

impl TouchReading {
    pub fn new(initial: f64) -> Self {
        let initial = sanitize_touch(initial);
        Self {
            initial,
            current: initial,
        }
    }

    /// Bipolar movement since note-on.
    #[inline]
    pub fn aftertouch(&self) -> f64 {
        self.current - self.initial
    }
}

impl TouchParameters {
    /// Baseline amplitude after initial-touch scaling.
    ///
    /// An amount of 1.0 makes amplitude proportional to the touch position;
    /// 0.0 leaves the baseline alone.
    #[inline]
    pub fn scaled_amplitude(&self, base: f64, touch: Option<&TouchReading>) -> f64 {
        match touch {
            Some(t) => base * (1.0 - self.initial_to_amplitude * (1.0 - t.initial)),
            None => base,
        }
    }

    /// Initial-touch filter contribution in octaves.
    #[inline]
    pub fn initial_filter_octaves(&self, touch: Option<&TouchReading>) -> f64 {
        touch.map_or(0.0, |t| self.initial_to_filter * t.initial)
    }

    #[inline]
    pub fn aftertouch_filter_octaves(&self, touch: Option<&TouchReading>) -> f64 {
        touch.map_or(0.0, |t| self.aftertouch_to_filter * t.aftertouch())
    }

    #[inline]
    pub fn aftertouch_modulation_index(&self, touch: Option<&TouchReading>) -> f64 {
        touch.map_or(0.0, |t| self.aftertouch_to_modulation_index * t.aftertouch())
    }

    #[inline]
    pub fn aftertouch_vibrato(&self, touch: Option<&TouchReading>) -> f64 {
        touch.map_or(0.0, |t| self.aftertouch_to_vibrato * t.aftertouch())
    }

    /// True if aftertouch moves the filter, which enables cutoff smoothing.
    #[inline]
    pub fn smooths_filter(&self) -> bool {
        self.aftertouch_to_filter != 0.0
    }
}

/// Clamp a touch coordinate into [0, 1]; non-finite input becomes 0.5.
#[inline]
pub fn sanitize_touch(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.5
    }
}
