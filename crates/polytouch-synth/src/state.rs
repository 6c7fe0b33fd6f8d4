//! Per-voice modulation runtime state.

use crate::params::{VoiceModulationParameters, VoiceParameters};
use crate::tracking::TouchReading;
use crate::waveform::wrap_phase;

/// One-pole coefficient applied per control tick to the aftertouch filter offset.
pub const FILTER_SMOOTHING_FACTOR: f64 = 0.3;

/// Envelope clocks, LFO phase, touch and baselines of one voice.
///
/// Baselines hold the configured values modulation is computed around. They
/// are only changed by [`set_baselines`](Self::set_baselines) and
/// [`set_base_frequency`](Self::set_base_frequency), never from a modulated
/// output.
#[derive(Debug, Clone, PartialEq)]
pub struct ModulationState {
    /// Seconds since the last gate transition.
    pub modulator_envelope_time: f64,
    pub auxiliary_envelope_time: f64,
    pub is_gate_open: bool,

    /// Envelope levels captured when the gate closed.
    pub modulator_sustain_level: f64,
    pub auxiliary_sustain_level: f64,

    /// Voice LFO phase in [0, 1).
    pub voice_lfo_phase: f64,
    /// Whole cycles completed since the phase was last reset.
    pub voice_lfo_cycles: u64,
    /// Onset ramp (0.0-1.0) applied to the voice LFO depth.
    pub voice_lfo_ramp_factor: f64,
    pub time_since_trigger: f64,

    pub touch: Option<TouchReading>,

    pub base_amplitude: f64,
    pub base_filter_cutoff: f64,
    pub base_modulation_index: f64,
    pub base_frequency: f64,
    pub base_modulator_multiplier: f64,

    last_smoothed_aftertouch: Option<f64>,
}

impl ModulationState {
    pub fn new(params: &VoiceParameters) -> Self {
        let mut state = Self {
            modulator_envelope_time: 0.0,
            auxiliary_envelope_time: 0.0,
            is_gate_open: false,
            modulator_sustain_level: 0.0,
            auxiliary_sustain_level: 0.0,
            voice_lfo_phase: 0.0,
            voice_lfo_cycles: 0,
            voice_lfo_ramp_factor: 1.0,
            time_since_trigger: 0.0,
            touch: None,
            base_amplitude: 0.0,
            base_filter_cutoff: 0.0,
            base_modulation_index: 0.0,
            base_frequency: 440.0,
            base_modulator_multiplier: 1.0,
            last_smoothed_aftertouch: None,
        };
        state.set_baselines(params);
        state
    }

    /// Start a note. The LFO phase survives only if `reset_lfo` is false.
    pub fn open_gate(&mut self, reset_lfo: bool, touch: Option<f64>) {
        self.modulator_envelope_time = 0.0;
        self.auxiliary_envelope_time = 0.0;
        self.is_gate_open = true;
        self.modulator_sustain_level = 0.0;
        self.auxiliary_sustain_level = 0.0;
        self.time_since_trigger = 0.0;
        self.voice_lfo_ramp_factor = 0.0;
        self.touch = touch.map(TouchReading::new);
        self.last_smoothed_aftertouch = None;
        if reset_lfo {
            self.reset_lfo();
        }
    }

    /// Enter the release stage from the levels the envelopes actually had.
    pub fn close_gate(&mut self, modulator_level: f64, auxiliary_level: f64) {
        self.modulator_sustain_level = modulator_level;
        self.auxiliary_sustain_level = auxiliary_level;
        self.modulator_envelope_time = 0.0;
        self.auxiliary_envelope_time = 0.0;
        self.is_gate_open = false;
    }

    pub fn reset_lfo(&mut self) {
        self.voice_lfo_phase = 0.0;
        self.voice_lfo_cycles = 0;
    }

    /// Advance envelope clocks and the onset ramp.
    pub fn advance(&mut self, dt: f64, onset_delay: f64) {
        self.modulator_envelope_time += dt;
        self.auxiliary_envelope_time += dt;
        self.time_since_trigger += dt;
        self.voice_lfo_ramp_factor = if onset_delay > 0.0 {
            (self.time_since_trigger / onset_delay).min(1.0)
        } else {
            1.0
        };
    }

    /// Advance the voice LFO by `rate_hz × dt` cycles.
    pub fn advance_lfo(&mut self, rate_hz: f64, dt: f64) {
        let step = rate_hz * dt;
        if !step.is_finite() || step <= 0.0 {
            return;
        }
        let position = self.voice_lfo_phase + step;
        let whole = position.floor();
        self.voice_lfo_cycles += whole as u64;
        self.voice_lfo_phase = wrap_phase(position - whole);
    }

    /// Unwrapped LFO position in cycles since the last reset.
    #[inline]
    pub fn voice_lfo_position(&self) -> f64 {
        self.voice_lfo_cycles as f64 + self.voice_lfo_phase
    }

    /// Current modulator and auxiliary envelope levels.
    pub fn envelope_levels(&self, mods: &VoiceModulationParameters) -> (f64, f64) {
        let modulator = mods.modulator_envelope.shape.value(
            self.modulator_envelope_time,
            self.is_gate_open,
            self.modulator_sustain_level,
        );
        let auxiliary = mods.auxiliary_envelope.shape.value(
            self.auxiliary_envelope_time,
            self.is_gate_open,
            self.auxiliary_sustain_level,
        );
        (modulator, auxiliary)
    }

    /// Update the live touch position. Ignored if the note carried no touch.
    pub fn set_touch(&mut self, x: f64) {
        if let Some(touch) = self.touch.as_mut() {
            touch.current = crate::tracking::sanitize_touch(x);
        }
    }

    #[inline]
    pub fn aftertouch(&self) -> f64 {
        self.touch.map_or(0.0, |t| t.aftertouch())
    }

    pub fn set_baselines(&mut self, params: &VoiceParameters) {
        self.base_amplitude = params.oscillator.amplitude;
        self.base_filter_cutoff = params.filter.cutoff;
        self.base_modulation_index = params.oscillator.modulation_index;
        self.base_modulator_multiplier = params.oscillator.modulating_multiplier;
    }

    pub fn set_base_frequency(&mut self, frequency: f64) {
        self.base_frequency = frequency;
    }

    /// One-pole smoothing of the aftertouch filter offset in octaves. The
    /// first value after a trigger passes through unchanged.
    pub fn smooth_aftertouch(&mut self, target: f64) -> f64 {
        let smoothed = match self.last_smoothed_aftertouch {
            Some(previous) => previous + (target - previous) * FILTER_SMOOTHING_FACTOR,
            None => target,
        };
        self.last_smoothed_aftertouch = Some(smoothed);
        smoothed
    }
}

impl Default for ModulationState {
    fn default() -> Self {
        Self::new(&VoiceParameters::default())
    }
}
