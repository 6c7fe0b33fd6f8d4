//! Modulation destinations and their scaling rules.
//!
//! Every source that targets a destination in a tick adds into one
//! [`DestinationSums`] slot. The slot is resolved once against the baseline
//! and written once, so a later source can never overwrite an earlier one.
//! Sums are kept in each destination's natural unit (octaves for the filter,
//! semitones for pitch, direct units elsewhere).
//!
//! Clamping is not applied here: combined values may transiently leave the
//! valid range, and [`Destination::clamp`] is applied at the point of writing.

/// A continuously modulated parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Filter cutoff in Hz. Sums are octaves.
    FilterCutoff,
    /// Oscillator pitch in Hz. Sums are semitones.
    Pitch,
    /// FM modulation index.
    ModulationIndex,
    /// Output amplitude (0.0-1.0).
    Amplitude,
    /// FM modulating multiplier (modulator/carrier ratio).
    FmRatio,
    /// Per-voice LFO rate in Hz.
    LfoRate,
    /// Per-voice LFO pitch depth ("vibrato amount") in semitones.
    LfoDepth,
    /// Shared delay-line time in seconds.
    DelayTime,
}

/// How a combined sum is applied to a baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// `base × 2^sum`
    Octaves,
    /// `base × 2^(sum / 12)`
    Semitones,
    /// `base + sum`
    Additive,
}

impl Destination {
    pub const ALL: [Destination; 8] = [
        Destination::FilterCutoff,
        Destination::Pitch,
        Destination::ModulationIndex,
        Destination::Amplitude,
        Destination::FmRatio,
        Destination::LfoRate,
        Destination::LfoDepth,
        Destination::DelayTime,
    ];

    /// Valid range enforced when the value is written.
    pub const fn range(self) -> (f64, f64) {
        match self {
            Destination::FilterCutoff => (20.0, 22_050.0),
            Destination::Pitch => (1.0, 20_000.0),
            Destination::ModulationIndex => (0.0, 10.0),
            Destination::Amplitude => (0.0, 1.0),
            Destination::FmRatio => (0.01, 32.0),
            Destination::LfoRate => (0.0, 40.0),
            Destination::LfoDepth => (0.0, 12.0),
            Destination::DelayTime => (0.0, 2.0),
        }
    }

    pub const fn scaling(self) -> Scaling {
        match self {
            Destination::FilterCutoff => Scaling::Octaves,
            Destination::Pitch => Scaling::Semitones,
            _ => Scaling::Additive,
        }
    }

    #[inline]
    pub fn clamp(self, value: f64) -> f64 {
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }

    /// Apply a combined sum to `base`. The result is not clamped.
    #[inline]
    pub fn resolve(self, base: f64, sum: f64) -> f64 {
        match self.scaling() {
            Scaling::Octaves => base * sum.exp2(),
            Scaling::Semitones => base * (sum / 12.0).exp2(),
            Scaling::Additive => base + sum,
        }
    }

    /// Resolve and clamp, or `None` if the result is not finite.
    #[inline]
    pub fn resolve_for_write(self, base: f64, sum: f64) -> Option<f64> {
        let value = self.resolve(base, sum);
        value.is_finite().then(|| self.clamp(value))
    }
}

/// Per-destination accumulator for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DestinationSums {
    pub filter_octaves: f64,
    pub pitch_semitones: f64,
    pub modulation_index: f64,
    pub amplitude: f64,
    pub fm_ratio: f64,
    pub lfo_rate: f64,
    pub lfo_depth: f64,
    pub delay_time: f64,
}

impl DestinationSums {
    /// Add one source's contribution.
    #[inline]
    pub fn add(&mut self, dest: Destination, value: f64) {
        match dest {
            Destination::FilterCutoff => self.filter_octaves += value,
            Destination::Pitch => self.pitch_semitones += value,
            Destination::ModulationIndex => self.modulation_index += value,
            Destination::Amplitude => self.amplitude += value,
            Destination::FmRatio => self.fm_ratio += value,
            Destination::LfoRate => self.lfo_rate += value,
            Destination::LfoDepth => self.lfo_depth += value,
            Destination::DelayTime => self.delay_time += value,
        }
    }

    #[inline]
    pub fn get(&self, dest: Destination) -> f64 {
        match dest {
            Destination::FilterCutoff => self.filter_octaves,
            Destination::Pitch => self.pitch_semitones,
            Destination::ModulationIndex => self.modulation_index,
            Destination::Amplitude => self.amplitude,
            Destination::FmRatio => self.fm_ratio,
            Destination::LfoRate => self.lfo_rate,
            Destination::LfoDepth => self.lfo_depth,
            Destination::DelayTime => self.delay_time,
        }
    }

    /// Resolve the accumulated sum for `dest` against `base` (unclamped).
    #[inline]
    pub fn resolve(&self, dest: Destination, base: f64) -> f64 {
        dest.resolve(base, self.get(dest))
    }
}
