//! A single stereo FM voice.
//!
//! A voice owns its [`ModulationState`] and writes combined modulation into a
//! [`SignalBackend`]. Every source targeting a destination is summed first and
//! the destination is written once per tick, so no source can overwrite
//! another.

use crate::backend::{SignalBackend, VoiceParam};
use crate::destination::{Destination, DestinationSums};
use crate::global::GlobalContributions;
use crate::params::{VoiceModulationParameters, VoiceParameters};
use crate::state::ModulationState;
use crate::store::ParameterSnapshot;
use crate::tracking::key_tracking_value;
use polytouch_core::Arc;
use tracing::{debug, error, warn};

pub struct Voice<B: SignalBackend> {
    index: usize,
    backend: B,
    initialized: bool,
    available: bool,
    frequency: f64,
    /// Pool clock at the last trigger.
    trigger_time: f64,
    /// Strictly increasing across the pool; breaks timestamp ties.
    trigger_seq: u64,
    /// Pool clock at which a releasing voice becomes available.
    available_at: Option<f64>,
    state: ModulationState,
    params: Arc<VoiceParameters>,
    modulation: Arc<VoiceModulationParameters>,
    written: [Option<f64>; VoiceParam::COUNT],
}

impl<B: SignalBackend> Voice<B> {
    pub fn new(index: usize, backend: B, snapshot: &ParameterSnapshot) -> Self {
        Self {
            index,
            backend,
            initialized: false,
            available: true,
            frequency: 440.0,
            trigger_time: 0.0,
            trigger_seq: 0,
            available_at: None,
            state: ModulationState::new(&snapshot.voice),
            params: Arc::clone(&snapshot.voice),
            modulation: Arc::clone(&snapshot.modulation),
            written: [None; VoiceParam::COUNT],
        }
    }

    /// Start the signal primitives. Only the first call has any effect.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.backend.start();
        self.initialized = true;
        self.apply_static();
        self.write_frequency(self.frequency);
    }

    /// Set the unmodulated note frequency.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
        self.state.set_base_frequency(frequency);
        if self.initialized {
            self.write_frequency(frequency);
        }
    }

    /// Start a note at pool time `now`.
    ///
    /// Touch-derived amplitude and filter values are written before the gate
    /// opens, so the first audible sample already reflects them.
    pub fn trigger(
        &mut self,
        now: f64,
        seq: u64,
        touch: Option<f64>,
        snapshot: &ParameterSnapshot,
        globals: &GlobalContributions,
    ) {
        debug_assert!(
            self.initialized,
            "voice {} triggered before initialize()",
            self.index
        );
        if !self.initialized {
            error!(voice = self.index, "Voice triggered before initialize()");
            self.initialize();
        }

        self.sync_parameters(snapshot);
        let reset_lfo = self.modulation.voice_lfo.reset_mode.resets_on_trigger();
        self.state.open_gate(reset_lfo, touch);

        self.available = false;
        self.available_at = None;
        self.trigger_time = now;
        self.trigger_seq = seq;

        self.apply_modulation(snapshot, globals, 0.0);
        self.backend.gate(true);
    }

    /// Close the gate. Modulation envelopes continue from their current
    /// levels and the voice becomes available once the amplitude release
    /// has elapsed.
    pub fn release(&mut self, now: f64) {
        if self.available || !self.state.is_gate_open {
            return;
        }
        self.backend.gate(false);
        let (modulator, auxiliary) = self.state.envelope_levels(&self.modulation);
        self.state.close_gate(modulator, auxiliary);
        self.available_at = Some(now + self.params.envelope.release.max(0.0));
    }

    /// Silence immediately and mark available, skipping the release stage.
    pub fn hard_stop(&mut self) {
        self.backend.gate(false);
        self.write(VoiceParam::LeftAmplitude, 0.0);
        self.write(VoiceParam::RightAmplitude, 0.0);
        self.state.close_gate(0.0, 0.0);
        self.available = true;
        self.available_at = None;
    }

    /// Mark the voice available if its release has finished by `now`.
    /// Returns true if the voice became available.
    pub fn settle(&mut self, now: f64) -> bool {
        match self.available_at {
            Some(at) if now >= at => {
                self.available = true;
                self.available_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn set_touch(&mut self, x: f64) {
        self.state.set_touch(x);
    }

    /// Advance this voice by `dt` seconds and write every modulated
    /// destination once.
    pub fn apply_modulation(
        &mut self,
        snapshot: &ParameterSnapshot,
        globals: &GlobalContributions,
        dt: f64,
    ) {
        self.sync_parameters(snapshot);
        let mods = Arc::clone(&self.modulation);
        let lfo = &mods.voice_lfo;
        let aux = &mods.auxiliary_envelope;

        self.state.advance(dt, lfo.onset_delay);
        let (modulator_level, auxiliary_level) = self.state.envelope_levels(&mods);
        let tracking = key_tracking_value(self.state.base_frequency);
        let touch = self.state.touch;
        let touch = touch.as_ref();

        let mut sums = DestinationSums::default();

        sums.add(Destination::LfoRate, mods.key_tracking.lfo_rate_hz(tracking));
        let rate = Destination::LfoRate
            .resolve_for_write(lfo.rate.hz(snapshot.tempo), sums.lfo_rate)
            .unwrap_or(0.0);
        self.state.advance_lfo(rate, dt);
        let lfo_value =
            lfo.waveform.value(self.state.voice_lfo_phase) * self.state.voice_lfo_ramp_factor;

        sums.add(Destination::LfoDepth, auxiliary_level * aux.vibrato_amount);
        sums.add(Destination::LfoDepth, mods.touch.aftertouch_vibrato(touch));
        let depth = Destination::LfoDepth
            .resolve_for_write(lfo.pitch_amount, sums.lfo_depth)
            .unwrap_or(0.0);

        sums.add(Destination::Pitch, auxiliary_level * aux.pitch_amount);
        sums.add(Destination::Pitch, lfo_value * depth);

        sums.add(Destination::FilterCutoff, auxiliary_level * aux.filter_amount);
        sums.add(Destination::FilterCutoff, lfo_value * lfo.filter_amount);
        sums.add(
            Destination::FilterCutoff,
            mods.key_tracking.filter_octaves(tracking),
        );
        sums.add(
            Destination::FilterCutoff,
            mods.touch.initial_filter_octaves(touch),
        );
        let mut aftertouch_octaves = mods.touch.aftertouch_filter_octaves(touch);
        if aftertouch_octaves.is_finite() && touch.is_some() && mods.touch.smooths_filter() {
            aftertouch_octaves = self.state.smooth_aftertouch(aftertouch_octaves);
        }
        sums.add(Destination::FilterCutoff, aftertouch_octaves);
        sums.add(Destination::FilterCutoff, globals.filter_octaves);

        sums.add(
            Destination::ModulationIndex,
            modulator_level * mods.modulator_envelope.amount,
        );
        sums.add(
            Destination::ModulationIndex,
            lfo_value * lfo.modulation_index_amount,
        );
        sums.add(
            Destination::ModulationIndex,
            mods.touch.aftertouch_modulation_index(touch),
        );

        sums.add(Destination::Amplitude, globals.amplitude);
        sums.add(Destination::FmRatio, globals.fm_ratio);

        let center = sums.resolve(Destination::Pitch, self.state.base_frequency);
        self.write_frequency(center);

        let amplitude = sums.resolve(
            Destination::Amplitude,
            mods.touch.scaled_amplitude(self.state.base_amplitude, touch),
        );
        self.write_pair(
            VoiceParam::LeftAmplitude,
            VoiceParam::RightAmplitude,
            Destination::Amplitude,
            amplitude,
        );

        let index = sums.resolve(Destination::ModulationIndex, self.state.base_modulation_index);
        self.write_pair(
            VoiceParam::LeftModulationIndex,
            VoiceParam::RightModulationIndex,
            Destination::ModulationIndex,
            index,
        );

        let ratio = sums.resolve(Destination::FmRatio, self.state.base_modulator_multiplier);
        self.write_pair(
            VoiceParam::LeftModulatingMultiplier,
            VoiceParam::RightModulatingMultiplier,
            Destination::FmRatio,
            ratio,
        );

        let cutoff = sums.resolve(Destination::FilterCutoff, self.state.base_filter_cutoff);
        self.write_checked(VoiceParam::FilterCutoff, Destination::FilterCutoff, cutoff);
    }

    /// Replace the signal primitives, keeping all modulation state.
    ///
    /// The new backend receives the last written values and, if the voice is
    /// sounding, an open gate. The old backend is stopped and returned.
    pub fn swap_backend(&mut self, backend: B) -> B {
        let mut old = std::mem::replace(&mut self.backend, backend);
        old.stop();
        if self.initialized {
            self.backend.start();
            self.apply_static();
            for param in VoiceParam::ALL {
                if let Some(value) = self.written[param.index()] {
                    self.backend.set(param, value);
                }
            }
            if self.is_active() && self.state.is_gate_open {
                self.backend.gate(true);
            }
        }
        debug!(voice = self.index, "Swapped signal backend");
        old
    }

    fn sync_parameters(&mut self, snapshot: &ParameterSnapshot) {
        if !Arc::ptr_eq(&self.params, &snapshot.voice) {
            self.params = Arc::clone(&snapshot.voice);
            self.state.set_baselines(&self.params);
            if self.initialized {
                self.apply_static();
            }
        }
        if !Arc::ptr_eq(&self.modulation, &snapshot.modulation) {
            self.modulation = Arc::clone(&snapshot.modulation);
        }
    }

    /// Parameters that are never modulated.
    fn apply_static(&mut self) {
        self.backend.set_envelope(self.params.envelope);
        let resonance = self.params.filter.resonance;
        if resonance.is_finite() {
            self.write(VoiceParam::FilterResonance, resonance.clamp(0.0, 1.0));
        }
        let carrier = self.params.oscillator.carrier_multiplier;
        self.write_checked(VoiceParam::CarrierMultiplier, Destination::FmRatio, carrier);
    }

    fn write_frequency(&mut self, center: f64) {
        if !center.is_finite() {
            warn!(voice = self.index, "Dropped non-finite frequency");
            return;
        }
        let (left, right) = self.params.detune.split(center);
        self.write_checked(VoiceParam::LeftFrequency, Destination::Pitch, left);
        self.write_checked(VoiceParam::RightFrequency, Destination::Pitch, right);
    }

    fn write_pair(&mut self, left: VoiceParam, right: VoiceParam, dest: Destination, value: f64) {
        self.write_checked(left, dest, value);
        self.write_checked(right, dest, value);
    }

    #[inline]
    fn write_checked(&mut self, param: VoiceParam, dest: Destination, value: f64) {
        if value.is_finite() {
            self.write(param, dest.clamp(value));
        } else {
            warn!(voice = self.index, ?param, "Dropped non-finite modulation value");
        }
    }

    #[inline]
    fn write(&mut self, param: VoiceParam, value: f64) {
        self.backend.set(param, value);
        self.written[param.index()] = Some(value);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_active(&self) -> bool {
        !self.available
    }

    /// True while the note is held (gate open).
    pub fn is_held(&self) -> bool {
        !self.available && self.state.is_gate_open
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn trigger_time(&self) -> f64 {
        self.trigger_time
    }

    pub fn trigger_seq(&self) -> u64 {
        self.trigger_seq
    }

    pub fn available_at(&self) -> Option<f64> {
        self.available_at
    }

    pub fn state(&self) -> &ModulationState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut ModulationState {
        &mut self.state
    }

    pub fn modulation(&self) -> &VoiceModulationParameters {
        &self.modulation
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Last value written to `param`.
    pub fn written(&self, param: VoiceParam) -> Option<f64> {
        self.written[param.index()]
    }
}

impl<B: SignalBackend> std::fmt::Debug for Voice<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("index", &self.index)
            .field("available", &self.available)
            .field("frequency", &self.frequency)
            .field("trigger_time", &self.trigger_time)
            .field("trigger_seq", &self.trigger_seq)
            .field("available_at", &self.available_at)
            .finish_non_exhaustive()
    }
}
