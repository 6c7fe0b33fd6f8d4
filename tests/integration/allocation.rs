//! Voice allocation integration tests
//!
//! Round-robin order, oldest-first stealing and mono ownership, driven
//! through the engine API.

use crate::helpers::*;
use polytouch::prelude::*;

/// Six notes on five voices: the sixth steals the first.
#[test]
fn test_sixth_note_steals_oldest() {
    let engine = test_engine();
    for key in 0..5 {
        let result = engine.note_on(key, 220.0 * (1.0 + key as f64 / 12.0));
        assert_eq!(result, AllocationResult::Allocated { voice: key as usize });
        run_for(&engine, 0.02);
    }

    let result = engine.note_on(5, 440.0);
    assert_eq!(
        result,
        AllocationResult::Stolen {
            voice: 0,
            stolen_key: Some(0)
        }
    );

    // The stolen key's note-off is ignored.
    engine.note_off(0);
    engine.with_pool(|pool| {
        assert!(pool.voice(0).unwrap().is_held());
        assert_eq!(pool.voice(0).unwrap().frequency(), 440.0);
    });
    assert_eq!(engine.status().mapped_keys, 5);
}

/// Round-robin keeps going from where it stopped and wraps at the end.
#[test]
fn test_round_robin_wraps_from_cursor() {
    let engine = test_engine();
    for key in 0..3 {
        engine.note_on(key, 220.0);
        engine.note_off(key);
    }
    // default release is 0.3 s
    run_for(&engine, 0.4);
    assert_eq!(engine.status().active_voices, 0);

    let order: Vec<usize> = (10..15)
        .map(|key| engine.note_on(key, 330.0).voice())
        .collect();
    assert_eq!(order, vec![3, 4, 0, 1, 2]);
}

#[test]
fn test_released_voices_return_after_release_time() {
    let mut params = VoiceParameters::default();
    params.envelope.release = 0.5;
    let engine = ModulationEngine::builder()
        .voices(1)
        .voice_parameters(params)
        .build_shared()
        .unwrap();

    engine.note_on(1, 220.0);
    engine.note_off(1);
    run_for(&engine, 0.25);
    assert_eq!(engine.status().active_voices, 1);

    // Still releasing, so the next note steals it.
    assert!(matches!(
        engine.note_on(2, 330.0),
        AllocationResult::Stolen {
            stolen_key: None,
            ..
        }
    ));
    engine.note_off(2);
    run_for(&engine, 0.55);
    assert_eq!(engine.status().active_voices, 0);
}

#[test]
fn test_mono_mode_follows_last_note() {
    let engine = test_engine();
    engine.set_voice_mode(VoiceMode::Mono);

    engine.note_on(1, 220.0);
    engine.note_on(2, 247.0);
    engine.note_on(3, 262.0);
    engine.with_pool(|pool| {
        assert_eq!(pool.mono_owner(), Some(3));
        assert_eq!(pool.status().active_voices, 1);
    });

    engine.note_off(1);
    engine.note_off(2);
    engine.with_pool(|pool| assert!(pool.voice(0).unwrap().is_held()));

    engine.note_off(3);
    engine.with_pool(|pool| assert!(!pool.voice(0).unwrap().is_held()));
}

#[test]
fn test_mode_switch_cuts_all_voices() {
    let engine = test_engine();
    engine.note_on(1, 220.0);
    engine.note_on(2, 330.0);

    engine.set_voice_mode(VoiceMode::Mono);
    let status = engine.status();
    assert_eq!(status.active_voices, 0);
    assert_eq!(status.mapped_keys, 0);

    engine.set_voice_mode(VoiceMode::Poly);
    assert_eq!(engine.note_on(3, 440.0).voice(), 0);
}

#[test]
fn test_panic_and_all_notes_off() {
    let engine = test_engine();
    for key in 0..4 {
        engine.note_on(key, 200.0);
    }
    engine.all_notes_off();
    assert_eq!(engine.status().mapped_keys, 0);
    assert_eq!(engine.status().active_voices, 4);

    engine.panic();
    assert_eq!(engine.status().active_voices, 0);
}

#[test]
fn test_pitch_multiplier_applies_to_new_notes() {
    let engine = test_engine();
    let controls = engine.voice_controls();
    engine.note_on(1, 220.0);
    engine.set_pitch_multiplier(0.5).unwrap();
    engine.note_on(2, 220.0);

    assert_eq!(controls[0].get(VoiceParam::LeftFrequency), 220.0);
    assert_eq!(controls[1].get(VoiceParam::LeftFrequency), 110.0);
}
