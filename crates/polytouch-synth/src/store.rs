//! Lock-free parameter store.
//!
//! Writers replace whole parameter structs; the control loop takes one
//! [`ParameterSnapshot`] per tick so every voice in that tick observes the
//! same configuration.

use crate::error::Result;
use crate::params::{
    DelayParameters, GlobalLfoParameters, VoiceModulationParameters, VoiceParameters,
};
use arc_swap::ArcSwap;
use polytouch_core::{validate_tempo, Arc, AtomicDouble, DEFAULT_TEMPO};

pub struct ParameterStore {
    voice: ArcSwap<VoiceParameters>,
    modulation: ArcSwap<VoiceModulationParameters>,
    global_lfo: ArcSwap<GlobalLfoParameters>,
    delay: ArcSwap<DelayParameters>,
    tempo: AtomicDouble,
}

/// One tick's view of the store.
#[derive(Debug, Clone)]
pub struct ParameterSnapshot {
    pub voice: Arc<VoiceParameters>,
    pub modulation: Arc<VoiceModulationParameters>,
    pub global_lfo: Arc<GlobalLfoParameters>,
    pub delay: Arc<DelayParameters>,
    pub tempo: f64,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        ParameterStore::default().snapshot()
    }
}

impl ParameterStore {
    pub fn new(
        voice: VoiceParameters,
        modulation: VoiceModulationParameters,
        global_lfo: GlobalLfoParameters,
        delay: DelayParameters,
        tempo: f64,
    ) -> Result<Self> {
        let tempo = validate_tempo(tempo)?;
        Ok(Self {
            voice: ArcSwap::from_pointee(voice),
            modulation: ArcSwap::from_pointee(modulation),
            global_lfo: ArcSwap::from_pointee(global_lfo),
            delay: ArcSwap::from_pointee(delay),
            tempo: AtomicDouble::new(tempo),
        })
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            voice: self.voice.load_full(),
            modulation: self.modulation.load_full(),
            global_lfo: self.global_lfo.load_full(),
            delay: self.delay.load_full(),
            tempo: self.tempo.get(),
        }
    }

    pub fn set_voice_parameters(&self, params: VoiceParameters) {
        self.voice.store(Arc::new(params));
    }

    pub fn set_voice_modulation(&self, params: VoiceModulationParameters) {
        self.modulation.store(Arc::new(params));
    }

    pub fn set_global_lfo(&self, params: GlobalLfoParameters) {
        self.global_lfo.store(Arc::new(params));
    }

    pub fn set_delay(&self, params: DelayParameters) {
        self.delay.store(Arc::new(params));
    }

    /// Set tempo in BPM. Rejected values leave the current tempo in place.
    pub fn set_tempo(&self, bpm: f64) -> Result<()> {
        self.tempo.set(validate_tempo(bpm)?);
        Ok(())
    }

    pub fn voice_parameters(&self) -> Arc<VoiceParameters> {
        self.voice.load_full()
    }

    pub fn voice_modulation(&self) -> Arc<VoiceModulationParameters> {
        self.modulation.load_full()
    }

    pub fn global_lfo(&self) -> Arc<GlobalLfoParameters> {
        self.global_lfo.load_full()
    }

    pub fn delay(&self) -> Arc<DelayParameters> {
        self.delay.load_full()
    }

    pub fn tempo(&self) -> f64 {
        self.tempo.get()
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            voice: ArcSwap::from_pointee(VoiceParameters::default()),
            modulation: ArcSwap::from_pointee(VoiceModulationParameters::default()),
            global_lfo: ArcSwap::from_pointee(GlobalLfoParameters::default()),
            delay: ArcSwap::from_pointee(DelayParameters::default()),
            tempo: AtomicDouble::new(DEFAULT_TEMPO),
        }
    }
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStore")
            .field("tempo", &self.tempo())
            .finish_non_exhaustive()
    }
}
