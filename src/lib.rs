//! # Polytouch - Voice Allocation and Modulation for Touch Instruments
//!
//! Turns note-on/note-off events into continuously evolving synthesis
//! parameters for a small fixed pool of stereo FM voices.
//!
//! ## Architecture
//!
//! Polytouch is an umbrella crate that coordinates:
//! - **polytouch-core** - Errors, lock-free scalars, engine config, control clock
//! - **polytouch-synth** - Voices, pool, envelopes, LFOs, key tracking, touch
//!
//! The [`ModulationEngine`] owns the pool and a control thread that ticks it
//! at a fixed rate (200 Hz by default). Each tick gathers every modulation
//! source per destination and writes the combined value once.
//!
//! ## Quick Start
//!
//! ```
//! use polytouch::prelude::*;
//!
//! let engine = ModulationEngine::builder().voices(5).build_shared()?;
//! let controls = engine.voice_controls();
//!
//! engine.note_on(57, 220.0);
//! engine.tick_now(0.005);
//! assert_eq!(controls[0].get(VoiceParam::LeftFrequency), 220.0);
//! # Ok::<(), polytouch::Error>(())
//! ```

/// Re-export of polytouch-core for direct access
pub use polytouch_core as core;

/// Re-export of polytouch-synth for direct access
pub use polytouch_synth as synth;

pub use polytouch_core::{EngineConfig, DEFAULT_CONTROL_RATE_HZ, DEFAULT_TEMPO, MAX_VOICES};

pub use polytouch_synth::{
    AdsrShape, AllocationResult, DelayControls, DelayParameters, DelayTime, DetuneMode,
    GlobalLfoParameters, KeyIndex, LfoRate, LfoResetMode, LfoWaveform, ParameterStore,
    SharedVoiceControls, SignalBackend, StereoDetune, VoiceControls, VoiceMode,
    VoiceModulationParameters, VoiceParam, VoiceParameters,
};

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;

pub use builder::EngineBuilder;
pub use engine::{EngineStatus, ModulationEngine, CONTROL_THREAD_NAME};

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{EngineBuilder, EngineStatus, ModulationEngine};

    // Parameters
    pub use crate::{
        AdsrShape, DelayParameters, DelayTime, GlobalLfoParameters, LfoRate, LfoResetMode,
        LfoWaveform, StereoDetune, VoiceModulationParameters, VoiceParameters,
    };

    // Voices
    pub use crate::{
        AllocationResult, KeyIndex, SharedVoiceControls, SignalBackend, VoiceControls, VoiceMode,
        VoiceParam,
    };
}
