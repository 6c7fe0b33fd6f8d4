//! Builder for configuring and constructing a `ModulationEngine`.

use crate::{ModulationEngine, Result};
use polytouch_core::{Arc, EngineConfig};
use polytouch_synth::{
    DelayControls, DelayParameters, GlobalLfoParameters, ParameterStore, SharedVoiceControls,
    SignalBackend, VoiceMode, VoiceModulationParameters, VoiceParameters, VoicePool,
};

/// Everything is validated in [`build`](Self::build); setters never fail.
///
/// # Example
///
/// ```
/// use polytouch::prelude::*;
///
/// let engine = ModulationEngine::builder()
///     .voices(8)
///     .voice_mode(VoiceMode::Mono)
///     .control_rate(250.0)
///     .build_shared()?;
///
/// assert_eq!(engine.config().voice_count, 8);
/// # Ok::<(), polytouch::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    voice_mode: VoiceMode,
    voice: VoiceParameters,
    modulation: VoiceModulationParameters,
    global_lfo: GlobalLfoParameters,
    delay: DelayParameters,
}

impl EngineBuilder {
    /// Replace the whole engine config.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 5
    pub fn voices(mut self, count: usize) -> Self {
        self.config.voice_count = count;
        self
    }

    /// Default: poly
    pub fn voice_mode(mut self, mode: VoiceMode) -> Self {
        self.voice_mode = mode;
        self
    }

    /// Default: 200 Hz
    pub fn control_rate(mut self, hz: f64) -> Self {
        self.config.control_rate_hz = hz;
        self
    }

    /// Default: 120 BPM
    pub fn tempo(mut self, bpm: f64) -> Self {
        self.config.tempo = bpm;
        self
    }

    pub fn voice_parameters(mut self, params: VoiceParameters) -> Self {
        self.voice = params;
        self
    }

    pub fn voice_modulation(mut self, params: VoiceModulationParameters) -> Self {
        self.modulation = params;
        self
    }

    pub fn global_lfo(mut self, params: GlobalLfoParameters) -> Self {
        self.global_lfo = params;
        self
    }

    pub fn delay(mut self, params: DelayParameters) -> Self {
        self.delay = params;
        self
    }

    /// Build with a backend per voice from `factory` (called with the voice index).
    pub fn build<B, F>(self, factory: F) -> Result<ModulationEngine<B>>
    where
        B: SignalBackend + 'static,
        F: FnMut(usize) -> B,
    {
        self.config.validate()?;

        let store = Arc::new(ParameterStore::new(
            self.voice,
            self.modulation,
            self.global_lfo,
            self.delay,
            self.config.tempo,
        )?);
        let delay = Arc::new(DelayControls::new());
        let pool = VoicePool::new(
            self.config.voice_count,
            self.voice_mode,
            Arc::clone(&store),
            Arc::clone(&delay),
            factory,
        )?;

        Ok(ModulationEngine::from_parts(pool, store, delay, self.config))
    }

    /// Build with [`SharedVoiceControls`] backends.
    pub fn build_shared(self) -> Result<ModulationEngine> {
        self.build(|_| SharedVoiceControls::new())
    }
}
