//! End-to-end modulation tests
//!
//! Parameters are read back from the shared voice controls the renderer
//! would see.

use crate::helpers::tolerances::{FLOAT_EPSILON, TICK_EPSILON};
use crate::helpers::*;
use approx::assert_relative_eq;
use polytouch::prelude::*;
use proptest::prelude::*;

/// Two free-running notes triggered 0.5 s apart at 2 Hz stay exactly one
/// cycle apart.
#[test]
fn test_free_running_lfo_offset() {
    let mut mods = VoiceModulationParameters::default();
    mods.voice_lfo.rate = LfoRate::Hertz(2.0);
    mods.voice_lfo.reset_mode = LfoResetMode::FreeRunning;
    let engine = test_engine_with(mods);

    engine.note_on(1, 220.0);
    run_for(&engine, 0.5);
    engine.note_on(2, 330.0);

    for _ in 0..4 {
        run_for(&engine, 0.13);
        let offset = lfo_position(&engine, 0) - lfo_position(&engine, 1);
        assert_relative_eq!(offset, 1.0, epsilon = TICK_EPSILON);
    }
}

#[test]
fn test_trigger_reset_realigns_phase() {
    let mut mods = VoiceModulationParameters::default();
    mods.voice_lfo.rate = LfoRate::Hertz(2.0);
    mods.voice_lfo.reset_mode = LfoResetMode::Trigger;
    let engine = test_engine_with(mods);
    engine.set_voice_mode(VoiceMode::Mono);

    engine.note_on(1, 220.0);
    run_for(&engine, 0.3);
    assert_relative_eq!(lfo_position(&engine, 0), 0.6, epsilon = TICK_EPSILON);

    engine.note_on(2, 247.0);
    assert_eq!(lfo_position(&engine, 0), 0.0);
}

/// Vibrato from the voice LFO moves both oscillators by the same interval.
#[test]
fn test_vibrato_depth() {
    let mut mods = VoiceModulationParameters::default();
    mods.voice_lfo.waveform = LfoWaveform::Square;
    mods.voice_lfo.rate = LfoRate::Hertz(0.5);
    mods.voice_lfo.pitch_amount = 12.0;
    let engine = test_engine_with(mods);
    let controls = engine.voice_controls();

    engine.note_on(1, 220.0);
    engine.tick_now(TICK);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftFrequency),
        440.0,
        epsilon = FLOAT_EPSILON
    );
    assert_relative_eq!(
        controls[0].get(VoiceParam::RightFrequency),
        440.0,
        epsilon = FLOAT_EPSILON
    );
}

#[test]
fn test_lfo_onset_delay_ramps_depth() {
    let mut mods = VoiceModulationParameters::default();
    mods.voice_lfo.waveform = LfoWaveform::Square;
    mods.voice_lfo.rate = LfoRate::Hertz(0.1);
    mods.voice_lfo.pitch_amount = 12.0;
    mods.voice_lfo.onset_delay = 1.0;
    let engine = test_engine_with(mods);
    let controls = engine.voice_controls();

    engine.note_on(1, 100.0);
    assert_relative_eq!(controls[0].get(VoiceParam::LeftFrequency), 100.0);

    run_for(&engine, 0.5);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftFrequency),
        100.0 * 0.5f64.exp2(),
        epsilon = TICK_EPSILON
    );

    run_for(&engine, 1.0);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftFrequency),
        200.0,
        epsilon = TICK_EPSILON
    );
}

/// Global tremolo, key tracking and initial touch all land in one write.
#[test]
fn test_voice_and_global_sources_combine() {
    let mut voice = VoiceParameters::default();
    voice.oscillator.amplitude = 0.8;
    voice.filter.cutoff = 400.0;

    let mut mods = VoiceModulationParameters::default();
    mods.key_tracking.filter_amount = 1.0;
    mods.touch.initial_to_filter = 1.0;
    mods.touch.initial_to_amplitude = 0.5;

    let engine = ModulationEngine::builder()
        .voices(2)
        .voice_parameters(voice)
        .voice_modulation(mods)
        .global_lfo(GlobalLfoParameters {
            waveform: LfoWaveform::Square,
            rate: LfoRate::Hertz(0.1),
            enabled: true,
            amplitude_amount: 0.5,
            filter_amount: 1.0,
            ..Default::default()
        })
        .build_shared()
        .unwrap();
    let controls = engine.voice_controls();

    engine.note_on_with_touch(1, 880.0, 1.0);
    engine.tick_now(TICK);

    // +1 octave tracking, +1 initial touch, +1 global LFO
    assert_relative_eq!(
        controls[0].get(VoiceParam::FilterCutoff),
        3_200.0,
        epsilon = 1e-6
    );
    // Square LFO at its high half leaves tremolo at unity.
    assert_relative_eq!(controls[0].get(VoiceParam::LeftAmplitude), 0.8);
}

#[test]
fn test_aftertouch_routes() {
    let mut voice = VoiceParameters::default();
    voice.oscillator.modulation_index = 2.0;
    let mut mods = VoiceModulationParameters::default();
    mods.touch.aftertouch_to_modulation_index = 4.0;
    let engine = ModulationEngine::builder()
        .voices(2)
        .voice_parameters(voice)
        .voice_modulation(mods)
        .build_shared()
        .unwrap();
    let controls = engine.voice_controls();

    engine.note_on_with_touch(1, 220.0, 0.5);
    engine.touch(1, 0.75);
    engine.tick_now(TICK);
    assert_relative_eq!(controls[0].get(VoiceParam::LeftModulationIndex), 3.0);

    engine.touch(1, 0.25);
    engine.tick_now(TICK);
    assert_relative_eq!(controls[0].get(VoiceParam::RightModulationIndex), 1.0);
}

/// Releasing mid-decay continues from the level actually reached.
#[test]
fn test_release_from_mid_decay() {
    let mut mods = VoiceModulationParameters::default();
    mods.modulator_envelope.shape = AdsrShape::new(0.0, 1.0, 0.2, 0.5);
    mods.modulator_envelope.amount = 5.0;
    let engine = test_engine_with(mods);
    let controls = engine.voice_controls();

    engine.note_on(1, 220.0);
    run_for(&engine, 0.5);
    let at_release = controls[0].get(VoiceParam::LeftModulationIndex);
    // base 1.0 + 5.0 × 0.6
    assert_relative_eq!(at_release, 4.0, epsilon = TICK_EPSILON);

    engine.note_off(1);
    engine.tick_now(0.0);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftModulationIndex),
        at_release,
        epsilon = TICK_EPSILON
    );

    run_for(&engine, 0.25);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftModulationIndex),
        1.0 + 3.0 * 0.5,
        epsilon = TICK_EPSILON
    );
}

#[test]
fn test_parameter_swap_applies_next_tick() {
    let engine = test_engine();
    let controls = engine.voice_controls();
    engine.note_on(1, 220.0);

    let mut params = VoiceParameters::default();
    params.filter.cutoff = 900.0;
    params.detune = StereoDetune::proportional(1.01);
    engine.set_voice_parameters(params);
    assert_eq!(controls[0].get(VoiceParam::FilterCutoff), 2_000.0);

    engine.tick_now(TICK);
    assert_eq!(controls[0].get(VoiceParam::FilterCutoff), 900.0);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftFrequency),
        222.2,
        epsilon = FLOAT_EPSILON
    );
}

#[test]
fn test_tempo_synced_delay() {
    let engine = ModulationEngine::builder()
        .tempo(120.0)
        .delay(DelayParameters {
            time: DelayTime::Beats(0.75),
            feedback: 0.4,
            mix: 0.3,
        })
        .build_shared()
        .unwrap();
    let delay = engine.delay_controls();

    engine.tick_now(TICK);
    assert_relative_eq!(delay.time.get(), 0.375, epsilon = FLOAT_EPSILON);

    engine.set_tempo(90.0).unwrap();
    engine.tick_now(TICK);
    assert_relative_eq!(delay.time.get(), 0.5, epsilon = FLOAT_EPSILON);
    assert_relative_eq!(delay.mix.get(), 0.3);
}

/// Square voice LFO at the top of its first half, so its output is +1 for
/// the first 0.5 s.
fn square_lfo(mods: &mut VoiceModulationParameters) {
    mods.voice_lfo.waveform = LfoWaveform::Square;
    mods.voice_lfo.rate = LfoRate::Hertz(1.0);
}

#[test]
fn test_auxiliary_envelope_deepens_vibrato() {
    let mut mods = VoiceModulationParameters::default();
    square_lfo(&mut mods);
    mods.auxiliary_envelope.shape = AdsrShape::new(0.0, 0.0, 1.0, 0.1);
    mods.auxiliary_envelope.vibrato_amount = 12.0;
    let engine = test_engine_with(mods);
    let controls = engine.voice_controls();

    engine.note_on(1, 100.0);
    engine.tick_now(TICK);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftFrequency),
        200.0,
        epsilon = FLOAT_EPSILON
    );
}

#[test]
fn test_auxiliary_envelope_bends_pitch() {
    let mut mods = VoiceModulationParameters::default();
    mods.auxiliary_envelope.shape = AdsrShape::new(0.0, 0.0, 1.0, 0.1);
    mods.auxiliary_envelope.pitch_amount = -12.0;
    let engine = test_engine_with(mods);
    let controls = engine.voice_controls();

    engine.note_on(1, 440.0);
    engine.tick_now(TICK);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftFrequency),
        220.0,
        epsilon = FLOAT_EPSILON
    );
    assert_relative_eq!(
        controls[0].get(VoiceParam::RightFrequency),
        220.0,
        epsilon = FLOAT_EPSILON
    );
}

#[test]
fn test_aftertouch_deepens_vibrato() {
    let mut mods = VoiceModulationParameters::default();
    square_lfo(&mut mods);
    mods.touch.aftertouch_to_vibrato = 24.0;
    let engine = test_engine_with(mods);
    let controls = engine.voice_controls();

    engine.note_on_with_touch(1, 100.0, 0.5);
    engine.tick_now(TICK);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftFrequency),
        100.0,
        epsilon = FLOAT_EPSILON
    );

    // +0.5 aftertouch × 24 = one octave of depth
    engine.touch(1, 1.0);
    engine.tick_now(TICK);
    assert_relative_eq!(
        controls[0].get(VoiceParam::LeftFrequency),
        200.0,
        epsilon = FLOAT_EPSILON
    );
}

#[test]
fn test_voice_lfo_moves_modulation_index() {
    let mut mods = VoiceModulationParameters::default();
    square_lfo(&mut mods);
    mods.voice_lfo.modulation_index_amount = 2.0;
    let engine = test_engine_with(mods);
    let controls = engine.voice_controls();

    engine.note_on(1, 220.0);
    engine.tick_now(TICK);
    assert_relative_eq!(controls[0].get(VoiceParam::LeftModulationIndex), 3.0);

    // second half of the cycle: 1.0 - 2.0 clamps at zero
    run_for(&engine, 0.6);
    assert_eq!(controls[0].get(VoiceParam::RightModulationIndex), 0.0);
}

#[test]
fn test_global_lfo_moves_fm_ratio() {
    let engine = ModulationEngine::builder()
        .voices(2)
        .global_lfo(GlobalLfoParameters {
            waveform: LfoWaveform::Square,
            rate: LfoRate::Hertz(1.0),
            enabled: true,
            fm_ratio_amount: 0.5,
            ..Default::default()
        })
        .build_shared()
        .unwrap();
    let controls = engine.voice_controls();

    engine.note_on(1, 220.0);
    engine.note_on(2, 330.0);
    engine.tick_now(TICK);
    for voice in 0..2 {
        assert_relative_eq!(
            controls[voice].get(VoiceParam::LeftModulatingMultiplier),
            1.5
        );
        assert_relative_eq!(
            controls[voice].get(VoiceParam::RightModulatingMultiplier),
            1.5
        );
    }
    // carrier is never modulated
    assert_eq!(controls[0].get(VoiceParam::CarrierMultiplier), 1.0);
}

/// An octave above A4 adds 1 Hz at a tracking amount of 3.
#[test]
fn test_key_tracking_speeds_up_voice_lfo() {
    let mut mods = VoiceModulationParameters::default();
    mods.voice_lfo.rate = LfoRate::Hertz(1.0);
    mods.key_tracking.lfo_rate_amount = 3.0;
    let engine = test_engine_with(mods);

    engine.note_on(1, 880.0);
    engine.note_on(2, 440.0);
    run_for(&engine, 0.25);

    assert_relative_eq!(lfo_position(&engine, 0), 0.5, epsilon = TICK_EPSILON);
    assert_relative_eq!(lfo_position(&engine, 1), 0.25, epsilon = TICK_EPSILON);
}

#[test]
fn test_clock_sync_resets_tempo_synced_lfos() {
    let mut mods = VoiceModulationParameters::default();
    mods.voice_lfo.rate = LfoRate::Hertz(2.0);
    mods.voice_lfo.reset_mode = LfoResetMode::TempoSync;
    let engine = ModulationEngine::builder()
        .voices(2)
        .voice_modulation(mods)
        .global_lfo(GlobalLfoParameters {
            rate: LfoRate::Hertz(1.0),
            enabled: true,
            ..Default::default()
        })
        .build_shared()
        .unwrap();

    engine.note_on(1, 220.0);
    run_for(&engine, 0.3);
    assert_relative_eq!(lfo_position(&engine, 0), 0.6, epsilon = TICK_EPSILON);
    engine.with_pool(|pool| {
        assert_relative_eq!(pool.global().lfo_phase(), 0.3, epsilon = TICK_EPSILON)
    });

    engine.sync_to_clock();
    assert_eq!(lfo_position(&engine, 0), 0.0);
    engine.with_pool(|pool| assert_eq!(pool.global().lfo_phase(), 0.0));
}

#[test]
fn test_clock_sync_leaves_trigger_mode_lfos() {
    let mut mods = VoiceModulationParameters::default();
    mods.voice_lfo.rate = LfoRate::Hertz(2.0);
    mods.voice_lfo.reset_mode = LfoResetMode::Trigger;
    let engine = test_engine_with(mods);

    engine.note_on(1, 220.0);
    run_for(&engine, 0.3);
    engine.sync_to_clock();
    assert_relative_eq!(lfo_position(&engine, 0), 0.6, epsilon = TICK_EPSILON);
}

proptest! {
    #[test]
    fn prop_detune_symmetry(f in 20.0f64..8_000.0, ratio in 1.0f64..1.06, hz in 0.0f64..5.0) {
        let (l, r) = StereoDetune::proportional(ratio).split(f);
        prop_assert!((l * r - f * f).abs() <= f * f * 1e-12);

        let (l, r) = StereoDetune::constant(hz).split(f);
        prop_assert!((l + r - 2.0 * f).abs() <= 1e-9);
    }

    #[test]
    fn prop_written_values_stay_in_range(
        cutoff in -1.0e6f64..1.0e6,
        index in -100.0f64..100.0,
        amplitude in -5.0f64..5.0,
        touch in -1.0f64..2.0,
    ) {
        let mut voice = VoiceParameters::default();
        voice.filter.cutoff = cutoff;
        voice.oscillator.modulation_index = index;
        voice.oscillator.amplitude = amplitude;
        let mut mods = VoiceModulationParameters::default();
        mods.touch.initial_to_filter = 3.0;
        mods.touch.aftertouch_to_filter = 2.0;
        let engine = ModulationEngine::builder()
            .voices(1)
            .voice_parameters(voice)
            .voice_modulation(mods)
            .build_shared()
            .unwrap();
        let controls = engine.voice_controls();

        engine.note_on_with_touch(1, 440.0, touch);
        engine.touch(1, 1.0 - touch);
        engine.tick_now(TICK);

        let cutoff = controls[0].get(VoiceParam::FilterCutoff);
        prop_assert!((20.0..=22_050.0).contains(&cutoff));
        let index = controls[0].get(VoiceParam::LeftModulationIndex);
        prop_assert!((0.0..=10.0).contains(&index));
        let amplitude = controls[0].get(VoiceParam::LeftAmplitude);
        prop_assert!((0.0..=1.0).contains(&amplitude));
    }
}
