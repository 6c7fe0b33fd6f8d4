//! Pool-wide modulation: tempo, the global LFO and the shared delay line.

use crate::backend::DelayControls;
use crate::destination::{Destination, DestinationSums};
use crate::params::{DelayParameters, MAX_DELAY_FEEDBACK};
use crate::store::ParameterSnapshot;
use crate::waveform::wrap_phase;
use polytouch_core::{Arc, DEFAULT_TEMPO};
use tracing::warn;

/// Global LFO contributions applied identically inside every active voice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalContributions {
    /// Raw LFO output in [-1, 1], or 0 while disabled.
    pub lfo_value: f64,
    /// Tremolo, added to the amplitude baseline. Never positive.
    pub amplitude: f64,
    /// Added to the modulator multiplier.
    pub fm_ratio: f64,
    pub filter_octaves: f64,
}

#[derive(Debug)]
pub struct GlobalModulationState {
    lfo_phase: f64,
    tempo: f64,
    delay_base: f64,
    delay: Arc<DelayControls>,
    applied_delay: Option<Arc<DelayParameters>>,
}

impl GlobalModulationState {
    pub fn new(delay: Arc<DelayControls>) -> Self {
        Self {
            lfo_phase: 0.0,
            tempo: DEFAULT_TEMPO,
            delay_base: 0.0,
            delay,
            applied_delay: None,
        }
    }

    /// Advance the shared clock by `dt` seconds. Called exactly once per tick,
    /// before any voice is processed.
    pub fn advance(&mut self, dt: f64, snapshot: &ParameterSnapshot) -> GlobalContributions {
        let tempo_changed = self.tempo != snapshot.tempo;
        self.tempo = snapshot.tempo;

        let delay_changed = !self
            .applied_delay
            .as_ref()
            .is_some_and(|applied| Arc::ptr_eq(applied, &snapshot.delay));
        if tempo_changed || delay_changed {
            // The base comes from tempo and settings only, never from the
            // last modulated delay time.
            self.delay_base = snapshot.delay.time.seconds(self.tempo);
            self.applied_delay = Some(Arc::clone(&snapshot.delay));
        }

        let lfo = &snapshot.global_lfo;
        let rate = Destination::LfoRate.clamp(lfo.rate.hz(self.tempo));
        self.lfo_phase = wrap_phase(self.lfo_phase + rate * dt);

        let mut sums = DestinationSums::default();
        let contributions = if lfo.enabled {
            let value = lfo.waveform.value(self.lfo_phase);
            sums.add(Destination::DelayTime, value * lfo.delay_time_amount);
            GlobalContributions {
                lfo_value: value,
                amplitude: lfo.amplitude_amount * (value - 1.0) * 0.5,
                fm_ratio: lfo.fm_ratio_amount * value,
                filter_octaves: lfo.filter_amount * value,
            }
        } else {
            GlobalContributions::default()
        };
        self.write_delay(&sums, &snapshot.delay);
        contributions
    }

    fn write_delay(&self, sums: &DestinationSums, params: &DelayParameters) {
        let time = Destination::DelayTime
            .resolve_for_write(self.delay_base, sums.get(Destination::DelayTime));
        match time {
            Some(time) => self.delay.time.set(time),
            None => warn!(base = self.delay_base, "Dropped non-finite delay time"),
        }

        if params.mix.is_finite() {
            self.delay.mix.set(params.mix.clamp(0.0, 1.0));
        }

        if params.feedback.is_finite() {
            self.delay
                .feedback
                .set(params.feedback.clamp(0.0, MAX_DELAY_FEEDBACK));
        }
    }

    /// Restart the global LFO from phase 0 (external clock sync).
    pub fn sync(&mut self) {
        self.lfo_phase = 0.0;
    }

    pub fn lfo_phase(&self) -> f64 {
        self.lfo_phase
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Unmodulated delay time in seconds.
    pub fn delay_base(&self) -> f64 {
        self.delay_base
    }

    pub fn delay_controls(&self) -> &Arc<DelayControls> {
        &self.delay
    }
}
