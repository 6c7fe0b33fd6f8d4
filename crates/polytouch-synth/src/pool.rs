//! Fixed-size voice pool with allocation and stealing.
//!
//! - **Poly**: round-robin from a cursor over free voices; when none is free
//!   the voice with the earliest trigger is stolen.
//! - **Mono**: always voice 0, hard-stopped if busy. The most recent key owns
//!   it and only that key's note-off releases it.
//!
//! Time is driven by the caller through [`VoicePool::tick`].

use crate::backend::{DelayControls, SignalBackend};
use crate::error::{Error, Result};
use crate::global::{GlobalContributions, GlobalModulationState};
use crate::params::LfoResetMode;
use crate::store::ParameterStore;
use crate::voice::Voice;
use polytouch_core::{Arc, MAX_VOICES};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Logical key identity from the keyboard layer.
pub type KeyIndex = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VoiceMode {
    Mono,
    #[default]
    Poly,
}

/// Outcome of a note-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationResult {
    /// A free voice was used.
    Allocated { voice: usize },
    /// A busy voice was cut off. `stolen_key` is the key that lost it, if it
    /// was still held.
    Stolen {
        voice: usize,
        stolen_key: Option<KeyIndex>,
    },
}

impl AllocationResult {
    pub fn voice(&self) -> usize {
        match *self {
            AllocationResult::Allocated { voice } | AllocationResult::Stolen { voice, .. } => voice,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Voices not yet available (held or releasing).
    pub active_voices: usize,
    pub mapped_keys: usize,
    pub voice_mode: VoiceMode,
}

pub struct VoicePool<B: SignalBackend> {
    voices: Vec<Voice<B>>,
    /// Key currently holding each voice.
    voice_keys: Vec<Option<KeyIndex>>,
    key_to_voice: HashMap<KeyIndex, usize>,
    mode: VoiceMode,
    mono_owner: Option<KeyIndex>,
    cursor: usize,
    clock: f64,
    next_seq: u64,
    pitch_multiplier: f64,
    store: Arc<ParameterStore>,
    global: GlobalModulationState,
    last_globals: GlobalContributions,
}

impl<B: SignalBackend> VoicePool<B> {
    /// Create `voice_count` voices from `factory` and initialize them.
    pub fn new(
        voice_count: usize,
        mode: VoiceMode,
        store: Arc<ParameterStore>,
        delay: Arc<DelayControls>,
        mut factory: impl FnMut(usize) -> B,
    ) -> Result<Self> {
        if voice_count == 0 || voice_count > MAX_VOICES {
            return Err(polytouch_core::Error::InvalidVoiceCount(voice_count).into());
        }

        let snapshot = store.snapshot();
        let voices = (0..voice_count)
            .map(|i| {
                let mut voice = Voice::new(i, factory(i), &snapshot);
                voice.initialize();
                voice
            })
            .collect();

        Ok(Self {
            voices,
            voice_keys: vec![None; voice_count],
            key_to_voice: HashMap::with_capacity(voice_count * 2),
            mode,
            mono_owner: None,
            cursor: 0,
            clock: 0.0,
            next_seq: 0,
            pitch_multiplier: 1.0,
            store,
            global: GlobalModulationState::new(delay),
            last_globals: GlobalContributions::default(),
        })
    }

    /// Start a note for `key` at `frequency` (before the pitch multiplier).
    pub fn allocate(
        &mut self,
        key: KeyIndex,
        frequency: f64,
        touch: Option<f64>,
    ) -> AllocationResult {
        self.settle();

        // A repeated note-on for a held key releases its old voice first.
        if self.mode == VoiceMode::Poly {
            if let Some(previous) = self.key_to_voice.remove(&key) {
                self.voices[previous].release(self.clock);
                self.voice_keys[previous] = None;
            }
        }

        let (voice, stolen) = match self.mode {
            VoiceMode::Mono => (0, !self.voices[0].is_available()),
            VoiceMode::Poly => match self.find_free_voice() {
                Some(voice) => (voice, false),
                None => (self.find_voice_to_steal(), true),
            },
        };
        if self.mode == VoiceMode::Poly {
            self.cursor = (voice + 1) % self.voices.len();
        }

        let stolen_key = self.voice_keys[voice].take();
        if let Some(old) = stolen_key {
            self.key_to_voice.remove(&old);
        }
        if stolen {
            self.voices[voice].hard_stop();
            debug!(voice, ?stolen_key, key, "Stole voice");
        }

        let snapshot = self.store.snapshot();
        let seq = self.next_seq;
        self.next_seq += 1;

        let target = &mut self.voices[voice];
        target.set_frequency(frequency * self.pitch_multiplier);
        target.trigger(self.clock, seq, touch, &snapshot, &self.last_globals);

        self.voice_keys[voice] = Some(key);
        self.key_to_voice.insert(key, voice);
        if self.mode == VoiceMode::Mono {
            self.mono_owner = Some(key);
        }

        if stolen {
            AllocationResult::Stolen { voice, stolen_key }
        } else {
            AllocationResult::Allocated { voice }
        }
    }

    /// Note-off. Unknown keys are ignored.
    pub fn release(&mut self, key: KeyIndex) {
        let Some(voice) = self.key_to_voice.remove(&key) else {
            return;
        };
        self.voice_keys[voice] = None;

        if self.mode == VoiceMode::Mono {
            if self.mono_owner != Some(key) {
                return;
            }
            self.mono_owner = None;
        }
        self.voices[voice].release(self.clock);
    }

    /// Update the live touch position of `key`'s voice.
    pub fn touch(&mut self, key: KeyIndex, x: f64) {
        if let Some(&voice) = self.key_to_voice.get(&key) {
            self.voices[voice].set_touch(x);
        }
    }

    /// Release every held voice.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.release(self.clock);
        }
        self.clear_keys();
    }

    /// Hard-stop every voice.
    pub fn panic(&mut self) {
        for voice in &mut self.voices {
            voice.hard_stop();
        }
        self.clear_keys();
    }

    /// Advance the pool by `dt` seconds.
    ///
    /// Global state is advanced once, then every busy voice is processed
    /// against the same parameter snapshot.
    pub fn tick(&mut self, dt: f64) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.clock += dt;
        self.settle();

        let snapshot = self.store.snapshot();
        self.last_globals = self.global.advance(dt, &snapshot);

        for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
            voice.apply_modulation(&snapshot, &self.last_globals, dt);
        }
    }

    /// Reset the global LFO and every tempo-synced voice LFO.
    pub fn sync_to_clock(&mut self) {
        self.global.sync();
        for voice in &mut self.voices {
            if voice.modulation().voice_lfo.reset_mode == LfoResetMode::TempoSync {
                voice.state_mut().reset_lfo();
            }
        }
    }

    /// Switch mono/poly. Every voice is cut off and all keys forgotten.
    pub fn set_voice_mode(&mut self, mode: VoiceMode) {
        if mode == self.mode {
            return;
        }
        self.panic();
        self.cursor = 0;
        self.mode = mode;
        debug!(?mode, "Voice mode changed");
    }

    /// Multiplier applied to every newly allocated note's frequency.
    pub fn set_pitch_multiplier(&mut self, multiplier: f64) -> Result<()> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(Error::InvalidPitchMultiplier(multiplier));
        }
        self.pitch_multiplier = multiplier;
        Ok(())
    }

    /// Swap every voice's backend, keeping modulation state. Returns the old
    /// backends (already stopped).
    pub fn replace_backends(&mut self, mut factory: impl FnMut(usize) -> B) -> Vec<B> {
        self.voices
            .iter_mut()
            .enumerate()
            .map(|(i, voice)| voice.swap_backend(factory(i)))
            .collect()
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            active_voices: self.voices.iter().filter(|v| v.is_active()).count(),
            mapped_keys: self.key_to_voice.len(),
            voice_mode: self.mode,
        }
    }

    fn settle(&mut self) {
        for voice in &mut self.voices {
            voice.settle(self.clock);
        }
    }

    fn find_free_voice(&self) -> Option<usize> {
        let n = self.voices.len();
        (0..n)
            .map(|offset| (self.cursor + offset) % n)
            .find(|&i| self.voices[i].is_available())
    }

    fn find_voice_to_steal(&self) -> usize {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active())
            .min_by(|(_, a), (_, b)| {
                a.trigger_time()
                    .total_cmp(&b.trigger_time())
                    .then(a.trigger_seq().cmp(&b.trigger_seq()))
            })
            .map_or(0, |(i, _)| i)
    }

    fn clear_keys(&mut self) {
        self.key_to_voice.clear();
        self.voice_keys.iter_mut().for_each(|k| *k = None);
        self.mono_owner = None;
    }

    pub fn voices(&self) -> &[Voice<B>] {
        &self.voices
    }

    pub fn voice(&self, index: usize) -> Option<&Voice<B>> {
        self.voices.get(index)
    }

    pub fn voice_for_key(&self, key: KeyIndex) -> Option<usize> {
        self.key_to_voice.get(&key).copied()
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn mode(&self) -> VoiceMode {
        self.mode
    }

    pub fn mono_owner(&self) -> Option<KeyIndex> {
        self.mono_owner
    }

    pub fn pitch_multiplier(&self) -> f64 {
        self.pitch_multiplier
    }

    /// Seconds of pool time elapsed.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn global(&self) -> &GlobalModulationState {
        &self.global
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }
}

impl<B: SignalBackend> std::fmt::Debug for VoicePool<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicePool")
            .field("voices", &self.voices)
            .field("mode", &self.mode)
            .field("mono_owner", &self.mono_owner)
            .field("cursor", &self.cursor)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
