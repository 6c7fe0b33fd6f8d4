//! ModulationEngine that owns the voice pool and drives it at control rate.

use crate::builder::EngineBuilder;
use crate::Result;
use parking_lot::Mutex;
use polytouch_core::{Arc, AtomicFlag, ControlClock, EngineConfig};
use polytouch_synth::{
    AllocationResult, DelayControls, DelayParameters, GlobalLfoParameters, KeyIndex,
    ParameterStore, SharedVoiceControls, SignalBackend, VoiceControls, VoiceMode,
    VoiceModulationParameters, VoiceParameters, VoicePool,
};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{error, info};

/// Name of the control-rate thread.
pub const CONTROL_THREAD_NAME: &str = "polytouch-control";

/// Snapshot of engine activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    pub active_voices: usize,
    pub mapped_keys: usize,
    pub voice_mode: VoiceMode,
    /// Whether the control thread is running.
    pub running: bool,
}

struct ControlThread {
    running: Arc<AtomicFlag>,
    handle: JoinHandle<()>,
}

/// Voice allocation and modulation engine.
///
/// Note events and parameter changes can come from any thread. The pool is
/// shared with the control thread behind a mutex that is held for one note
/// event or one tick at a time; parameter structs are swapped lock-free and
/// picked up at the next tick.
///
/// # Example
///
/// ```
/// use polytouch::prelude::*;
///
/// let engine = ModulationEngine::builder()
///     .voices(5)
///     .tempo(96.0)
///     .build_shared()?;
///
/// engine.start()?;
/// engine.note_on_with_touch(60, 261.63, 0.7);
/// engine.touch(60, 0.9);
/// engine.note_off(60);
/// engine.stop();
/// # Ok::<(), polytouch::Error>(())
/// ```
pub struct ModulationEngine<B: SignalBackend + 'static = SharedVoiceControls> {
    pool: Arc<Mutex<VoicePool<B>>>,
    store: Arc<ParameterStore>,
    delay: Arc<DelayControls>,
    config: EngineConfig,
    control: Mutex<Option<ControlThread>>,
}

impl ModulationEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

impl<B: SignalBackend + 'static> ModulationEngine<B> {
    pub(crate) fn from_parts(
        pool: VoicePool<B>,
        store: Arc<ParameterStore>,
        delay: Arc<DelayControls>,
        config: EngineConfig,
    ) -> Self {
        Self {
            pool: Arc::new(Mutex::new(pool)),
            store,
            delay,
            config,
            control: Mutex::new(None),
        }
    }

    /// Spawn the control thread. Does nothing if it is already running.
    pub fn start(&self) -> Result<()> {
        let mut control = self.control.lock();
        if control.is_some() {
            return Ok(());
        }

        let running = Arc::new(AtomicFlag::new(true));
        let pool = Arc::clone(&self.pool);
        let flag = Arc::clone(&running);
        let rate_hz = self.config.control_rate_hz;

        let handle = std::thread::Builder::new()
            .name(CONTROL_THREAD_NAME.into())
            .spawn(move || run_control_loop(pool, flag, rate_hz))?;

        info!(rate_hz, "Control loop started");
        *control = Some(ControlThread { running, handle });
        Ok(())
    }

    /// Stop and join the control thread. Safe to call repeatedly.
    pub fn stop(&self) {
        let Some(control) = self.control.lock().take() else {
            return;
        };
        control.running.set(false);
        if control.handle.join().is_err() {
            error!("Control thread panicked");
        }
        info!("Control loop stopped");
    }

    pub fn is_running(&self) -> bool {
        self.control.lock().is_some()
    }

    /// Advance the engine by `dt` seconds on the calling thread.
    pub fn tick_now(&self, dt: f64) {
        self.pool.lock().tick(dt);
    }

    pub fn note_on(&self, key: KeyIndex, frequency: f64) -> AllocationResult {
        self.pool.lock().allocate(key, frequency, None)
    }

    /// Note-on carrying the initial touch position (0.0-1.0).
    pub fn note_on_with_touch(&self, key: KeyIndex, frequency: f64, x: f64) -> AllocationResult {
        self.pool.lock().allocate(key, frequency, Some(x))
    }

    pub fn note_off(&self, key: KeyIndex) {
        self.pool.lock().release(key);
    }

    /// Live touch position for a held key.
    pub fn touch(&self, key: KeyIndex, x: f64) {
        self.pool.lock().touch(key, x);
    }

    pub fn all_notes_off(&self) {
        self.pool.lock().all_notes_off();
    }

    pub fn panic(&self) {
        self.pool.lock().panic();
    }

    /// Reset the global LFO and tempo-synced voice LFOs (external clock sync).
    pub fn sync_to_clock(&self) {
        self.pool.lock().sync_to_clock();
    }

    pub fn set_voice_parameters(&self, params: VoiceParameters) {
        self.store.set_voice_parameters(params);
    }

    pub fn set_voice_modulation(&self, params: VoiceModulationParameters) {
        self.store.set_voice_modulation(params);
    }

    pub fn set_global_lfo(&self, params: GlobalLfoParameters) {
        self.store.set_global_lfo(params);
    }

    pub fn set_delay(&self, params: DelayParameters) {
        self.store.set_delay(params);
    }

    pub fn set_tempo(&self, bpm: f64) -> Result<()> {
        self.store.set_tempo(bpm)?;
        Ok(())
    }

    pub fn set_voice_mode(&self, mode: VoiceMode) {
        self.pool.lock().set_voice_mode(mode);
    }

    pub fn set_pitch_multiplier(&self, multiplier: f64) -> Result<()> {
        self.pool.lock().set_pitch_multiplier(multiplier)?;
        Ok(())
    }

    /// Recreate every voice's signal backend. Returns the stopped old ones.
    pub fn replace_backends(&self, factory: impl FnMut(usize) -> B) -> Vec<B> {
        self.pool.lock().replace_backends(factory)
    }

    pub fn status(&self) -> EngineStatus {
        let pool = self.pool.lock().status();
        EngineStatus {
            active_voices: pool.active_voices,
            mapped_keys: pool.mapped_keys,
            voice_mode: pool.voice_mode,
            running: self.is_running(),
        }
    }

    /// Run `f` with the pool locked.
    pub fn with_pool<R>(&self, f: impl FnOnce(&VoicePool<B>) -> R) -> R {
        f(&self.pool.lock())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn parameters(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    /// Delay-line parameters for the effect renderer.
    pub fn delay_controls(&self) -> Arc<DelayControls> {
        Arc::clone(&self.delay)
    }
}

impl ModulationEngine<SharedVoiceControls> {
    /// Per-voice parameter blocks for the audio renderer, in voice order.
    pub fn voice_controls(&self) -> Vec<Arc<VoiceControls>> {
        self.pool
            .lock()
            .voices()
            .iter()
            .map(|v| v.backend().controls())
            .collect()
    }
}

impl<B: SignalBackend + 'static> Drop for ModulationEngine<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_control_loop<B: SignalBackend>(
    pool: Arc<Mutex<VoicePool<B>>>,
    running: Arc<AtomicFlag>,
    rate_hz: f64,
) {
    let mut clock = ControlClock::new(rate_hz, Instant::now());
    while running.get() {
        std::thread::sleep(clock.time_until_next(Instant::now()));
        if !running.get() {
            break;
        }
        let dt = clock.tick(Instant::now());
        pool.lock().tick(dt);
    }
}
