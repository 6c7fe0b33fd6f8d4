//! Test helpers and fixtures for polytouch integration tests
//!
//! Engines are driven manually through `tick_now` so every test is
//! deterministic; only the engine lifecycle tests start the control thread.

pub mod tolerances;

use polytouch::prelude::*;

/// Nominal control tick (200 Hz).
pub const TICK: f64 = 0.005;

/// Five-voice poly engine with shared controls.
pub fn test_engine() -> ModulationEngine {
    init_tracing();
    ModulationEngine::builder()
        .voices(5)
        .build_shared()
        .expect("Failed to create test engine")
}

/// Five-voice engine with custom modulation routing.
pub fn test_engine_with(modulation: VoiceModulationParameters) -> ModulationEngine {
    init_tracing();
    ModulationEngine::builder()
        .voices(5)
        .voice_modulation(modulation)
        .build_shared()
        .expect("Failed to create test engine")
}

/// Advance the engine by `seconds` in nominal control ticks.
pub fn run_for(engine: &ModulationEngine, seconds: f64) {
    let ticks = (seconds / TICK).round() as usize;
    for _ in 0..ticks {
        engine.tick_now(TICK);
    }
}

/// Unwrapped voice LFO position (cycles since reset) of a voice.
pub fn lfo_position(engine: &ModulationEngine, voice: usize) -> f64 {
    engine.with_pool(|pool| {
        pool.voice(voice)
            .map(|v| v.state().voice_lfo_position())
            .expect("voice index out of range")
    })
}

/// Route test logs through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
