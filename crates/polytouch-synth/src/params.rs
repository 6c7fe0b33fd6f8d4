//! Declarative parameter sets.
//!
//! Every struct here is replaced as a whole (see [`ParameterStore`]); nothing
//! in the control loop mutates them field by field.
//!
//! [`ParameterStore`]: crate::ParameterStore

use crate::detune::StereoDetune;
use crate::envelope::AdsrShape;
use crate::waveform::LfoWaveform;
use serde::{Deserialize, Serialize};

/// FM oscillator pair baselines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParameters {
    pub carrier_multiplier: f64,
    pub modulating_multiplier: f64,
    pub modulation_index: f64,
    /// Per-oscillator amplitude (0.0-1.0).
    pub amplitude: f64,
}

impl Default for OscillatorParameters {
    fn default() -> Self {
        Self {
            carrier_multiplier: 1.0,
            modulating_multiplier: 1.0,
            modulation_index: 1.0,
            amplitude: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParameters {
    /// Cutoff in Hz.
    pub cutoff: f64,
    /// Resonance (0.0-1.0).
    pub resonance: f64,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            cutoff: 2_000.0,
            resonance: 0.0,
        }
    }
}

/// Preset base values of a voice. Modulation is computed around these.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VoiceParameters {
    pub oscillator: OscillatorParameters,
    pub filter: FilterParameters,
    /// Amplitude envelope, handed to the signal backend as-is.
    pub envelope: AdsrShape,
    pub detune: StereoDetune,
}

/// Envelope hardwired to the FM modulation index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModulatorEnvelope {
    pub shape: AdsrShape,
    /// Modulation index added at full envelope level.
    pub amount: f64,
}

impl Default for ModulatorEnvelope {
    fn default() -> Self {
        Self {
            shape: AdsrShape::default(),
            amount: 0.0,
        }
    }
}

/// Envelope routed to pitch, filter cutoff and vibrato depth at once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryEnvelope {
    pub shape: AdsrShape,
    /// Semitones at full level.
    pub pitch_amount: f64,
    /// Octaves at full level.
    pub filter_amount: f64,
    /// Semitones added to the voice LFO pitch depth at full level.
    pub vibrato_amount: f64,
}

impl Default for AuxiliaryEnvelope {
    fn default() -> Self {
        Self {
            shape: AdsrShape::default(),
            pitch_amount: 0.0,
            filter_amount: 0.0,
            vibrato_amount: 0.0,
        }
    }
}

/// LFO speed, either free or locked to the tempo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LfoRate {
    Hertz(f64),
    /// Cycles per beat.
    TempoSync(f64),
}

impl Default for LfoRate {
    fn default() -> Self {
        LfoRate::Hertz(5.0)
    }
}

impl LfoRate {
    /// Rate in Hz at the given tempo. Non-finite rates resolve to 0.
    pub fn hz(self, tempo: f64) -> f64 {
        let hz = match self {
            LfoRate::Hertz(hz) => hz,
            LfoRate::TempoSync(cycles_per_beat) => tempo / 60.0 * cycles_per_beat,
        };
        if hz.is_finite() {
            hz
        } else {
            0.0
        }
    }
}

/// What happens to a voice LFO's phase when the voice is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LfoResetMode {
    /// Phase carries over from the previous note on the same voice.
    FreeRunning,
    #[default]
    Trigger,
    /// Reset on trigger and on every external clock sync.
    TempoSync,
}

impl LfoResetMode {
    #[inline]
    pub fn resets_on_trigger(self) -> bool {
        !matches!(self, LfoResetMode::FreeRunning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceLfoParameters {
    pub waveform: LfoWaveform,
    pub rate: LfoRate,
    pub reset_mode: LfoResetMode,
    /// Vibrato depth in semitones.
    pub pitch_amount: f64,
    /// Octaves.
    pub filter_amount: f64,
    pub modulation_index_amount: f64,
    /// Seconds after trigger over which the LFO depth fades in.
    pub onset_delay: f64,
}

impl Default for VoiceLfoParameters {
    fn default() -> Self {
        Self {
            waveform: LfoWaveform::Sine,
            rate: LfoRate::default(),
            reset_mode: LfoResetMode::default(),
            pitch_amount: 0.0,
            filter_amount: 0.0,
            modulation_index_amount: 0.0,
            onset_delay: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyTrackingParameters {
    /// 1.0 makes the filter cutoff follow the note pitch exactly.
    pub filter_amount: f64,
    /// Hz added to the voice LFO rate at the top of the tracked range.
    pub lfo_rate_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TouchParameters {
    pub initial_to_amplitude: f64,
    /// Octaves at full initial touch.
    pub initial_to_filter: f64,
    /// Octaves per unit of aftertouch.
    pub aftertouch_to_filter: f64,
    pub aftertouch_to_modulation_index: f64,
    /// Semitones of vibrato depth per unit of aftertouch.
    pub aftertouch_to_vibrato: f64,
}

/// Per-voice modulation routing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VoiceModulationParameters {
    pub modulator_envelope: ModulatorEnvelope,
    pub auxiliary_envelope: AuxiliaryEnvelope,
    pub voice_lfo: VoiceLfoParameters,
    pub key_tracking: KeyTrackingParameters,
    pub touch: TouchParameters,
}

/// Pool-wide LFO shared by every voice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalLfoParameters {
    pub waveform: LfoWaveform,
    pub rate: LfoRate,
    pub enabled: bool,
    /// Tremolo depth (0.0-1.0).
    pub amplitude_amount: f64,
    pub fm_ratio_amount: f64,
    /// Octaves.
    pub filter_amount: f64,
    /// Seconds.
    pub delay_time_amount: f64,
}

impl Default for GlobalLfoParameters {
    fn default() -> Self {
        Self {
            waveform: LfoWaveform::Sine,
            rate: LfoRate::Hertz(1.0),
            enabled: false,
            amplitude_amount: 0.0,
            fm_ratio_amount: 0.0,
            filter_amount: 0.0,
            delay_time_amount: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DelayTime {
    Seconds(f64),
    Beats(f64),
}

impl DelayTime {
    /// Unmodulated delay time at the given tempo.
    pub fn seconds(self, tempo: f64) -> f64 {
        match self {
            DelayTime::Seconds(s) => s,
            DelayTime::Beats(beats) => 60.0 / tempo * beats,
        }
    }
}

/// Shared delay line settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayParameters {
    pub time: DelayTime,
    /// 0.0-0.99
    pub feedback: f64,
    /// 0.0-1.0
    pub mix: f64,
}

impl Default for DelayParameters {
    fn default() -> Self {
        Self {
            time: DelayTime::Beats(0.5),
            feedback: 0.3,
            mix: 0.0,
        }
    }
}

/// Upper bound for delay feedback.
pub const MAX_DELAY_FEEDBACK: f64 = 0.99;
