use std::sync::Arc;

use morph_dsp::{
    distortion::{CommonParams, DistortionType},
    dsp::{crossfade::PowerFollower, oscillator::OscillatorBlock},
    morph::{
        node::default_nodes, ControlContext, MorphEngine, MorphMode, MorphNode, MorphPath,
        ProcessorBudget,
    },
    WEIGHT_EPSILON,
};

const SR: f32 = 48_000.0;

fn engine() -> MorphEngine {
    let mut engine = MorphEngine::new(ProcessorBudget::shared());
    engine.prepare(SR, 256);
    engine
}

fn tone() -> OscillatorBlock {
    OscillatorBlock::sine(220.0, SR)
}

fn rms_db(engine: &mut MorphEngine, seconds: f32) -> f32 {
    let mut osc = tone();
    let mut power = PowerFollower::new(100.0, SR);
    for _ in 0..(seconds * SR) as usize {
        power.process(engine.process(osc.next_sample() * 0.5));
    }
    10.0 * power.power().max(1e-12).log10()
}

#[test]
fn linear_soft_clip_to_fuzz_weights() {
    let mut engine = engine();
    engine.set_nodes(&[
        MorphNode::new(0, DistortionType::SoftClip),
        MorphNode::new(1, DistortionType::Fuzz),
    ]);
    engine.set_mode(MorphMode::Linear1D);
    engine.set_smoothing_time_ms(0.0);

    engine.set_morph_position(0.0, 0.0);
    engine.process(0.1);
    assert_eq!(engine.weights().weights(), &[1.0, 0.0, 0.0, 0.0]);

    engine.set_morph_position(1.0, 0.0);
    engine.process(0.1);
    assert_eq!(engine.weights().weights(), &[0.0, 1.0, 0.0, 0.0]);

    engine.set_morph_position(0.5, 0.0);
    engine.process(0.1);
    let w = engine.weights();
    assert!((w.get(0) - 0.5).abs() < 1e-5);
    assert!((w.get(1) - 0.5).abs() < 1e-5);
}

#[test]
fn planar_corners_meet_in_the_middle() {
    let mut engine = engine();
    engine.set_nodes(&default_nodes());
    engine.set_active_node_count(4);
    engine.set_mode(MorphMode::Planar2D);
    engine.set_morph_position(0.5, 0.5);
    engine.process(0.0);

    for i in 0..4 {
        assert!((engine.weights().get(i) - 0.25).abs() < 1e-5);
    }
}

#[test]
fn weights_stay_normalized_while_gliding() {
    let cursors = [(0.0, 0.0), (1.0, 1.0), (0.2, 0.9), (0.7, 0.3), (0.5, 0.5)];
    for mode in MorphMode::ALL {
        let mut engine = engine();
        engine.set_nodes(&default_nodes());
        engine.set_active_node_count(4);
        engine.set_mode(mode);
        engine.set_smoothing_time_ms(40.0);

        let mut osc = tone();
        for &(x, y) in &cursors {
            engine.set_morph_position(x, y);
            for _ in 0..2_000 {
                let out = engine.process(osc.next_sample() * 0.5);
                assert!(out.is_finite());
                let w = engine.weights();
                assert!((w.sum() - 1.0).abs() < 1e-5, "{mode}: sum {}", w.sum());
                assert!(w.weights().iter().all(|v| *v >= 0.0));
            }
        }
    }
}

#[test]
fn cursor_on_node_takes_full_weight_in_radial_mode() {
    let mut engine = engine();
    engine.set_nodes(&default_nodes());
    engine.set_active_node_count(4);
    engine.set_mode(MorphMode::Radial2D);
    engine.set_morph_position(1.0, 1.0);
    engine.process(0.0);
    assert_eq!(engine.weights().weights(), &[0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn same_family_runs_one_processor_cross_family_runs_several() {
    let budget = ProcessorBudget::shared();
    let mut same = MorphEngine::new(Arc::clone(&budget));
    same.prepare(SR, 128);
    same.set_nodes(&[
        MorphNode::new(0, DistortionType::Bitcrush),
        MorphNode::new(1, DistortionType::SampleReduce),
        MorphNode::new(2, DistortionType::Quantize),
    ]);
    same.set_active_node_count(3);
    same.set_mode(MorphMode::Planar2D);
    same.set_morph_position(0.4, 0.4);

    let mut cross = MorphEngine::new(Arc::clone(&budget));
    cross.prepare(SR, 128);
    cross.set_nodes(&[
        MorphNode::new(0, DistortionType::Tape),
        MorphNode::new(1, DistortionType::RingSaturation),
    ]);
    cross.set_morph_position(0.5, 0.0);

    let mut block = [0.3f32; 128];
    same.process_block(&mut block);
    cross.process_block(&mut block);

    assert_eq!(same.path(), MorphPath::Interpolated);
    assert_eq!(same.active_processor_count(), 1);
    assert_eq!(same.granted_processors(), 1);

    assert_eq!(cross.path(), MorphPath::CrossFamily);
    assert!(cross.active_processor_count() >= 2);
    assert_eq!(budget.active_count(), 1 + cross.granted_processors());
}

#[test]
fn cross_family_level_stays_within_one_db() {
    let node_a = MorphNode::new(0, DistortionType::SoftClip)
        .with_common(CommonParams::new(2.0, 1.0, 8000.0));
    let node_b = MorphNode::new(1, DistortionType::SineFold)
        .with_common(CommonParams::new(1.0, 1.0, 8000.0));

    let level_at = |position: f32| {
        let mut engine = engine();
        engine.set_nodes(&[node_a, node_b]);
        engine.set_morph_position(position, 0.0);
        rms_db(&mut engine, 0.5)
    };

    let single_a = level_at(0.0);
    let single_b = level_at(1.0);
    let low = single_a.min(single_b) - 1.0;
    let high = single_a.max(single_b) + 1.0;

    for step in 0..=20 {
        let position = step as f32 / 20.0;
        let level = level_at(position);
        assert!(
            (low..=high).contains(&level),
            "position {position}: {level:.2} dB outside [{low:.2}, {high:.2}]"
        );
    }
}

#[test]
fn position_smoothing_settles_in_time() {
    let mut engine = engine();
    engine.set_smoothing_time_ms(100.0);
    engine.set_morph_position(0.0, 0.0);
    engine.process(0.0);
    engine.set_morph_position(1.0, 0.0);

    let mut settled_at = None;
    for n in 1..=(SR as usize) {
        engine.process(0.0);
        if settled_at.is_none() && engine.smoothed_position().0 >= 0.95 {
            settled_at = Some(n);
        }
    }
    let ms = settled_at.map(|n| n as f32 / SR * 1000.0);
    assert!(
        ms.is_some_and(|ms| (95.0..=105.0).contains(&ms)),
        "settled at {ms:?} ms"
    );
    assert!(!engine.is_smoothing());
}

#[test]
fn raw_weight_driver_at_twenty_hz_never_jumps() {
    let mut engine = engine();
    engine.set_nodes(&default_nodes());
    engine.set_active_node_count(4);
    engine.set_smoothing_time_ms(30.0);
    engine.set_control_context(ControlContext::Automated);

    let a = [1.0, 0.0, 0.0, 0.0];
    let b = [0.0, 0.0, 0.5, 0.5];
    engine.set_raw_weights(&a);
    engine.process(0.0);

    let coeff = 1.0 - 0.05f32.powf(1.0 / (0.030 * SR));
    let max_step = coeff + 2.0 * WEIGHT_EPSILON + 1e-4;
    let half_period = (SR / 40.0) as usize;

    let mut osc = tone();
    let mut prev = *engine.weights();
    for n in 0..(5 * SR as usize) {
        if n % half_period == 0 {
            let target = if (n / half_period) % 2 == 0 { &b } else { &a };
            engine.set_raw_weights(target);
        }
        let out = engine.process(osc.next_sample() * 0.5);
        assert!(out.is_finite());

        let w = engine.weights();
        for i in 0..4 {
            let step = (w.get(i) - prev.get(i)).abs();
            assert!(step <= max_step, "sample {n}, slot {i}: step {step}");
        }
        prev = *w;
    }
}

#[test]
fn reset_then_replay_is_identical() {
    let run = |engine: &mut MorphEngine| {
        engine.set_nodes(&[
            MorphNode::new(0, DistortionType::Tube),
            MorphNode::new(1, DistortionType::Chaos),
            MorphNode::new(2, DistortionType::SineFold),
            MorphNode::new(3, DistortionType::Granular),
        ]);
        engine.set_active_node_count(4);
        engine.set_mode(MorphMode::Planar2D);
        engine.set_smoothing_time_ms(30.0);
        engine.set_morph_position(0.2, 0.7);

        let mut osc = tone();
        let mut out = vec![0.0; 9_600];
        for (i, chunk) in out.chunks_mut(4_800).enumerate() {
            if i == 1 {
                engine.set_morph_position(0.9, 0.1);
            }
            for s in chunk.iter_mut() {
                *s = osc.next_sample() * 0.5;
            }
            engine.process_block(chunk);
        }
        out
    };

    let mut engine = engine();
    let first = run(&mut engine);
    engine.reset();
    let second = run(&mut engine);
    assert_eq!(first, second);
}

#[test]
fn configuration_survives_reset() {
    let mut engine = engine();
    engine.set_nodes(&default_nodes());
    engine.set_active_node_count(3);
    engine.set_mode(MorphMode::Radial2D);
    engine.set_smoothing_time_ms(120.0);
    engine.set_morph_position(0.3, 0.8);
    engine.process(0.2);

    engine.reset();
    assert_eq!(engine.active_node_count(), 3);
    assert_eq!(engine.mode(), MorphMode::Radial2D);
    assert_eq!(engine.smoothing_time_ms(), 120.0);
    assert_eq!(engine.morph_position(), Some((0.3, 0.8)));
    assert_eq!(engine.nodes(), &default_nodes());
}
