//! Voice allocation and modulation for polytouch.
//!
//! - **[`VoicePool`]** - Fixed pool of voices with round-robin allocation,
//!   oldest-first stealing and mono/poly modes
//! - **[`Voice`]** - Stereo FM voice that combines every modulation source
//!   into one write per destination per tick
//! - **[`ModulationState`]** - Envelope clocks, LFO phase, touch, baselines
//! - **[`GlobalModulationState`]** - Tempo, global LFO and delay line
//! - **[`ParameterStore`]** - Whole-struct parameter replacement via `ArcSwap`
//! - **[`SignalBackend`]** - Boundary to the signal-generation primitives
//!
//! Everything here is single-threaded and deterministic: time only moves
//! when the caller passes `dt` to [`VoicePool::tick`].
//!
//! # Example
//!
//! ```
//! use polytouch_core::Arc;
//! use polytouch_synth::{DelayControls, ParameterStore, SharedVoiceControls, VoiceMode, VoicePool};
//!
//! let store = Arc::new(ParameterStore::default());
//! let mut pool = VoicePool::new(
//!     5,
//!     VoiceMode::Poly,
//!     store,
//!     Arc::new(DelayControls::new()),
//!     |_| SharedVoiceControls::new(),
//! )?;
//!
//! pool.allocate(60, 261.63, Some(0.8));
//! pool.tick(0.005);
//! pool.release(60);
//! # Ok::<(), polytouch_synth::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod backend;
pub use backend::{DelayControls, SharedVoiceControls, SignalBackend, VoiceControls, VoiceParam};

mod destination;
pub use destination::{Destination, DestinationSums, Scaling};

mod detune;
pub use detune::{DetuneMode, StereoDetune};

mod envelope;
pub use envelope::{AdsrShape, EnvelopeStage};

mod global;
pub use global::{GlobalContributions, GlobalModulationState};

mod params;
pub use params::{
    AuxiliaryEnvelope, DelayParameters, DelayTime, FilterParameters, GlobalLfoParameters,
    KeyTrackingParameters, LfoRate, LfoResetMode, ModulatorEnvelope, OscillatorParameters,
    TouchParameters, VoiceLfoParameters, VoiceModulationParameters, VoiceParameters,
    MAX_DELAY_FEEDBACK,
};

mod pool;
pub use pool::{AllocationResult, KeyIndex, PoolStatus, VoiceMode, VoicePool};

mod state;
pub use state::{ModulationState, FILTER_SMOOTHING_FACTOR};

mod store;
pub use store::{ParameterSnapshot, ParameterStore};

mod tracking;
pub use tracking::{
    key_tracking_value, sanitize_touch, TouchReading, KEY_TRACKING_CENTER_HZ,
    KEY_TRACKING_OCTAVES,
};

mod voice;
pub use voice::Voice;

mod waveform;
pub use waveform::{wrap_phase, LfoWaveform};
