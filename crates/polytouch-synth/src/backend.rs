//! Boundary to the signal-generation primitives.
//!
//! The engine never renders audio. It writes parameters into a
//! [`SignalBackend`] every control tick; writes must take effect
//! immediately, without any ramp inside the backend.

use crate::envelope::AdsrShape;
use polytouch_core::{Arc, AtomicDouble, AtomicFlag, Ordering};
use std::sync::atomic::AtomicU64;

/// Continuously variable parameter of one voice's primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceParam {
    LeftFrequency,
    RightFrequency,
    LeftAmplitude,
    RightAmplitude,
    CarrierMultiplier,
    LeftModulatingMultiplier,
    RightModulatingMultiplier,
    LeftModulationIndex,
    RightModulationIndex,
    FilterCutoff,
    FilterResonance,
}

impl VoiceParam {
    pub const COUNT: usize = 11;

    pub const ALL: [VoiceParam; Self::COUNT] = [
        VoiceParam::LeftFrequency,
        VoiceParam::RightFrequency,
        VoiceParam::LeftAmplitude,
        VoiceParam::RightAmplitude,
        VoiceParam::CarrierMultiplier,
        VoiceParam::LeftModulatingMultiplier,
        VoiceParam::RightModulatingMultiplier,
        VoiceParam::LeftModulationIndex,
        VoiceParam::RightModulationIndex,
        VoiceParam::FilterCutoff,
        VoiceParam::FilterResonance,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Signal primitives behind one voice (two FM oscillators, a filter and an
/// amplitude envelope).
pub trait SignalBackend: Send {
    fn start(&mut self);
    fn stop(&mut self);
    fn set(&mut self, param: VoiceParam, value: f64);
    fn set_envelope(&mut self, shape: AdsrShape);
    /// Open or close the amplitude envelope gate. Opening always restarts
    /// the envelope from its attack stage.
    fn gate(&mut self, open: bool);
}

/// Lock-free parameter block an audio renderer reads from.
#[derive(Debug)]
pub struct VoiceControls {
    params: [AtomicDouble; VoiceParam::COUNT],
    attack: AtomicDouble,
    decay: AtomicDouble,
    sustain: AtomicDouble,
    release: AtomicDouble,
    gate: AtomicFlag,
    running: AtomicFlag,
    triggers: AtomicU64,
}

impl VoiceControls {
    pub fn new() -> Self {
        let shape = AdsrShape::default();
        Self {
            params: std::array::from_fn(|_| AtomicDouble::new(0.0)),
            attack: AtomicDouble::new(shape.attack),
            decay: AtomicDouble::new(shape.decay),
            sustain: AtomicDouble::new(shape.sustain),
            release: AtomicDouble::new(shape.release),
            gate: AtomicFlag::new(false),
            running: AtomicFlag::new(false),
            triggers: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn get(&self, param: VoiceParam) -> f64 {
        self.params[param.index()].get()
    }

    pub fn envelope(&self) -> AdsrShape {
        AdsrShape {
            attack: self.attack.get(),
            decay: self.decay.get(),
            sustain: self.sustain.get(),
            release: self.release.get(),
        }
    }

    #[inline]
    pub fn is_gate_open(&self) -> bool {
        self.gate.get()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Number of gate openings so far. A renderer that sees this change must
    /// restart its envelope even if it never observed the gate closed.
    #[inline]
    pub fn trigger_count(&self) -> u64 {
        self.triggers.load(Ordering::Acquire)
    }
}

impl Default for VoiceControls {
    fn default() -> Self {
        Self::new()
    }
}

/// [`SignalBackend`] that publishes every write into shared [`VoiceControls`].
#[derive(Debug, Clone, Default)]
pub struct SharedVoiceControls {
    controls: Arc<VoiceControls>,
}

impl SharedVoiceControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for the audio side.
    pub fn controls(&self) -> Arc<VoiceControls> {
        Arc::clone(&self.controls)
    }
}

impl SignalBackend for SharedVoiceControls {
    fn start(&mut self) {
        self.controls.running.set(true);
    }

    fn stop(&mut self) {
        self.controls.gate.set(false);
        self.controls.running.set(false);
    }

    #[inline]
    fn set(&mut self, param: VoiceParam, value: f64) {
        self.controls.params[param.index()].set(value);
    }

    fn set_envelope(&mut self, shape: AdsrShape) {
        self.controls.attack.set(shape.attack);
        self.controls.decay.set(shape.decay);
        self.controls.sustain.set(shape.sustain);
        self.controls.release.set(shape.release);
    }

    fn gate(&mut self, open: bool) {
        if open {
            self.controls.triggers.fetch_add(1, Ordering::AcqRel);
        }
        self.controls.gate.set(open);
    }
}

/// Delay-line parameters written once per tick outside any voice.
#[derive(Debug)]
pub struct DelayControls {
    pub time: AtomicDouble,
    pub feedback: AtomicDouble,
    pub mix: AtomicDouble,
}

impl DelayControls {
    pub fn new() -> Self {
        Self {
            time: AtomicDouble::new(0.0),
            feedback: AtomicDouble::new(0.0),
            mix: AtomicDouble::new(0.0),
        }
    }
}

impl Default for DelayControls {
    fn default() -> Self {
        Self::new()
    }
}
