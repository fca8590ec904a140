use std::f32::consts::{PI, TAU};

use crate::{
    distortion::{CommonParams, DistortionAdapter, DistortionFamily, DistortionType, TypeParams},
    dsp::{
        crossfade::blend_dry_wet,
        distortion as shape,
        envelope::EnvelopeFollower,
        filter::{DcBlocker, SVFilter},
        noise::Noise,
        sanitize::sanitize_sample,
    },
    MIN_SAMPLE_RATE,
};

/*
Reference Distortion Adapter
============================

One struct that can run any of the 26 distortion types. The morph engine owns
several of these (one per node plus one shared instance) and reconfigures them
freely, so two rules hold throughout:

  1. configure() never clears history. Switching the type or nudging a
     parameter mid-stream keeps filters, delay lines and detectors warm.

  2. After prepare(), nothing allocates. The only heap buffer (shared by the
     feedback delay and the grain recorder) is sized for the longest delay and
     grain the parameter ranges allow.

Signal path for every type:

    input ──┬──→ shape(type) ──→ tone low-pass ──┐
            │                                    ├──→ dry/wet mix ──→ output
            └────────────────────────────────────┘

The per-type shapers are deliberately compact. They are a working stand-in for
full production algorithms, not a replacement for them; none oversample.
*/

const MAX_DELAY_MS: f32 = 50.0;
const MAX_GRAIN_MS: f32 = 100.0;
const MIN_DRIVE: f32 = 0.1;
const FORMANT_BASE_HZ: [f32; 2] = [700.0, 1220.0];
const LORENZ_START: [f32; 3] = [0.1, 0.0, 0.0];

#[derive(Debug, Clone, Copy, Default)]
struct Grain {
    age: usize,
    read_pos: usize,
}

pub struct Waveshaper {
    kind: DistortionType,
    common: CommonParams,
    params: TypeParams,
    sample_rate: f32,

    tone: SVFilter,
    dc: DcBlocker,

    // Sample-and-hold (SampleReduce, Aliasing)
    hold_countdown: f32,
    held: f32,

    envelope: EnvelopeFollower,
    ring_phase: f32,

    // Circular buffer shared by FeedbackDist and Granular
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,

    allpass_coeff: f32,
    allpass_x1: f32,
    allpass_y1: f32,
    loop_out: f32,

    lorenz: [f32; 3],
    formants: [SVFilter; 2],
    split: SVFilter,

    grains: [Grain; 2],
    grain_len: usize,

    noise: Noise,
    drift: f32,
}

impl Waveshaper {
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = sample_rate.max(MIN_SAMPLE_RATE);
        let common = CommonParams::default();
        let params = TypeParams::default();
        let mut formants = [
            SVFilter::bandpass(FORMANT_BASE_HZ[0], sample_rate),
            SVFilter::bandpass(FORMANT_BASE_HZ[1], sample_rate),
        ];
        for f in formants.iter_mut() {
            f.set_resonance(0.85);
        }

        let mut shaper = Self {
            kind: DistortionType::default(),
            common,
            params,
            sample_rate,
            tone: SVFilter::lowpass(common.tone_hz, sample_rate),
            dc: DcBlocker::new(sample_rate),
            hold_countdown: 0.0,
            held: 0.0,
            envelope: EnvelopeFollower::new(sample_rate, params.attack_ms, params.release_ms),
            ring_phase: 0.0,
            buffer: Vec::new(),
            write_pos: 0,
            delay_samples: 1,
            allpass_coeff: 0.0,
            allpass_x1: 0.0,
            allpass_y1: 0.0,
            loop_out: 0.0,
            lorenz: LORENZ_START,
            formants,
            split: SVFilter::lowpass(params.resonance_hz, sample_rate),
            grains: [Grain::default(); 2],
            grain_len: 1,
            noise: Noise::default(),
            drift: 0.0,
        };
        shaper.apply_params();
        shaper
    }

    pub fn kind(&self) -> DistortionType {
        self.kind
    }

    pub fn common(&self) -> &CommonParams {
        &self.common
    }

    pub fn params(&self) -> &TypeParams {
        &self.params
    }

    /// Recompute everything derived from parameters. History is untouched.
    fn apply_params(&mut self) {
        let sr = self.sample_rate;
        let p = self.params;

        self.tone.set_cutoff(self.common.tone_hz);
        self.envelope.set_times(p.attack_ms, p.release_ms);

        let t = (PI * p.resonance_hz.min(sr * 0.45) / sr).tan();
        self.allpass_coeff = (t - 1.0) / (t + 1.0);

        let shift = 2.0f32.powf(p.formant_shift);
        for (filter, base) in self.formants.iter_mut().zip(FORMANT_BASE_HZ) {
            filter.set_cutoff(base * shift);
        }
        self.split.set_cutoff(p.resonance_hz);

        let len = self.buffer.len();
        if len > 2 {
            self.delay_samples = ((p.delay_ms / 1000.0 * sr) as usize).clamp(1, len - 1);
            self.grain_len = ((p.grain_ms / 1000.0 * sr) as usize).clamp(16, len / 2 - 1);
        }
    }

    #[inline]
    fn shape(&mut self, x: f32, external_envelope: Option<f32>) -> f32 {
        use DistortionType::*;

        let d = self.common.drive.max(MIN_DRIVE);
        let p = self.params;

        match self.kind {
            SoftClip => shape::soft_clip(x, d),
            HardClip => shape::hard_clip(x, d, p.threshold),
            Tube => shape::tube(x, d, p.bias),
            Tape => shape::tape(x, d, p.sag),
            Fuzz => shape::fuzz(x, d),
            AsymmetricFuzz => shape::asymmetric_fuzz(x, d, p.bias),

            SineFold => shape::sine_fold(x, d),
            TriangleFold => shape::triangle_fold(x, d, p.threshold),
            SergeFold => shape::serge_fold(x, d, p.folds),

            FullRectify => self.dc.process(shape::full_rectify(x, d)),
            HalfRectify => self.dc.process(shape::half_rectify(x, d)),

            Bitcrush => shape::bit_crush(shape::hard_clip(x, d, 1.0), p.bit_depth),
            SampleReduce => {
                let v = shape::hard_clip(x, d, 1.0);
                self.sample_and_hold(v, p.downsample)
            }
            Quantize => {
                let v = shape::hard_clip(x, d, 1.0);
                let q = shape::quantize(v, 2.0f32.powf(p.bit_depth * 0.5));
                v + (q - v) * (1.0 - p.smoothness)
            }
            Aliasing => {
                // Hold without any anti-alias filtering; folded first so the
                // imaged partials are dense.
                let v = shape::sine_fold(x, d);
                self.sample_and_hold(v, p.downsample)
            }
            BitwiseMangler => {
                let v = shape::hard_clip(x, d, 1.0);
                let int = (v * 32767.0) as i32;
                let bits = (p.mangle * 12.0) as u32;
                let mask = ((1i32 << bits) - 1) & 0x5555;
                (int ^ mask) as f32 / 32767.0
            }

            Temporal => {
                let own = self.envelope.process(x);
                let env = external_envelope.unwrap_or(own);
                let coupled = d * (1.0 + 4.0 * p.sensitivity * env);
                shape::fast_tanh(x * coupled)
            }

            RingSaturation => {
                let sat = shape::fast_tanh(x * d);
                let carrier = (self.ring_phase * TAU).sin();
                self.ring_phase += p.mod_freq_hz / self.sample_rate;
                if self.ring_phase >= 1.0 {
                    self.ring_phase -= 1.0;
                }
                0.5 * sat + 0.5 * sat * carrier
            }
            FeedbackDist => {
                if self.buffer.is_empty() {
                    return shape::fast_tanh(x * d);
                }
                let len = self.buffer.len();
                let read = (self.write_pos + len - self.delay_samples) % len;
                let y = shape::fast_tanh(d * (x + p.feedback * self.buffer[read]));
                self.buffer[self.write_pos] = y;
                self.write_pos = (self.write_pos + 1) % len;
                y
            }
            AllpassResonant => {
                let input = x + p.feedback * self.loop_out;
                let a = self.allpass_coeff;
                let ap = a * input + self.allpass_x1 - a * self.allpass_y1;
                self.allpass_x1 = input;
                self.allpass_y1 = ap;
                let y = shape::fast_tanh(d * ap);
                self.loop_out = y;
                y
            }

            Chaos => {
                let m = self.step_lorenz(p.chaos_rate);
                shape::fast_tanh(x * d * (1.0 + 0.5 * m))
            }
            Formant => {
                let sat = shape::fast_tanh(x * d);
                let bands = self.formants[0].process(sat) + self.formants[1].process(sat);
                0.25 * bands + 0.3 * sat
            }
            Granular => {
                let sat = shape::fast_tanh(x * d);
                self.granulate(sat, p.jitter)
            }
            Spectral => {
                // Band-split tilt: lows driven gently, highs driven hard
                let low = self.split.process(x);
                let high = x - low;
                0.6 * shape::fast_tanh(low * d) + 0.6 * shape::fast_tanh(high * d * 3.0)
            }
            Fractal => {
                let depth = (p.folds.round() as usize).clamp(1, 6);
                let (mut sum, mut norm, mut scale, mut amp) = (0.0, 0.0, 1.0, 1.0);
                for _ in 0..depth {
                    sum += amp * shape::fast_tanh(x * d * scale);
                    norm += amp;
                    scale *= 2.0;
                    amp *= 0.5;
                }
                sum / norm
            }
            Stochastic => {
                let target = self.noise.next_bipolar();
                self.drift += 0.002 * (target - self.drift);
                let wobble = (self.drift * 10.0).clamp(-0.9, 0.9);
                shape::fast_tanh(x * d * (1.0 + p.jitter * wobble))
            }
        }
    }

    #[inline]
    fn sample_and_hold(&mut self, value: f32, factor: f32) -> f32 {
        if self.hold_countdown <= 0.0 {
            self.held = value;
            self.hold_countdown += factor.max(1.0);
        }
        self.hold_countdown -= 1.0;
        self.held
    }

    /// Euler step of the Lorenz system; returns x normalized to about ±1.
    #[inline]
    fn step_lorenz(&mut self, rate: f32) -> f32 {
        let dt = 0.01 * rate;
        let [x, y, z] = self.lorenz;
        let next = [
            x + 10.0 * (y - x) * dt,
            y + (x * (28.0 - z) - y) * dt,
            z + (x * y - (8.0 / 3.0) * z) * dt,
        ];
        self.lorenz = if next.iter().all(|v| v.is_finite()) {
            next
        } else {
            LORENZ_START
        };
        (self.lorenz[0] / 20.0).clamp(-1.0, 1.0)
    }

    /// Two overlapping Hann² grains replaying recent input.
    #[inline]
    fn granulate(&mut self, sample: f32, jitter: f32) -> f32 {
        if self.buffer.is_empty() {
            return sample;
        }
        let len = self.buffer.len();
        let grain_len = self.grain_len;
        self.buffer[self.write_pos] = sample;

        let mut out = 0.0;
        for i in 0..self.grains.len() {
            let mut grain = self.grains[i];
            if grain.age >= grain_len {
                grain.age = 0;
            }
            if grain.age == 0 {
                let spread = (self.noise.next_unipolar() * jitter * grain_len as f32) as usize;
                grain.read_pos = (self.write_pos + 2 * len - grain_len - spread) % len;
            }
            let w = (PI * grain.age as f32 / grain_len as f32).sin();
            out += self.buffer[grain.read_pos] * w * w;
            grain.read_pos = (grain.read_pos + 1) % len;
            grain.age += 1;
            self.grains[i] = grain;
        }

        self.write_pos = (self.write_pos + 1) % len;
        out
    }

    #[inline]
    fn render(&mut self, input: f32, external_envelope: Option<f32>) -> f32 {
        let x = sanitize_sample(input);
        let wet = self.shape(x, external_envelope);
        let toned = self.tone.process(wet);
        let out = blend_dry_wet(x, toned, self.common.mix);
        if out.is_finite() {
            out
        } else {
            self.reset();
            0.0
        }
    }
}

impl Default for Waveshaper {
    fn default() -> Self {
        Self::new(48_000.0)
    }
}

impl DistortionAdapter for Waveshaper {
    fn prepare(&mut self, sample_rate: f32, _max_block_size: usize) {
        self.sample_rate = sample_rate.max(MIN_SAMPLE_RATE);
        self.tone.set_sample_rate(self.sample_rate);
        self.dc.set_sample_rate(self.sample_rate);
        self.envelope.set_sample_rate(self.sample_rate);
        for f in self.formants.iter_mut() {
            f.set_sample_rate(self.sample_rate);
        }
        self.split.set_sample_rate(self.sample_rate);

        // Room for the longest grain plus its maximum jitter, which also covers
        // the longest feedback delay.
        let longest_ms = (2.0 * MAX_GRAIN_MS).max(MAX_DELAY_MS);
        let len = (longest_ms / 1000.0 * self.sample_rate) as usize + 4;
        self.buffer = vec![0.0; len];

        self.apply_params();
        self.reset();
    }

    fn configure(&mut self, kind: DistortionType, common: &CommonParams, params: &TypeParams) {
        self.kind = kind;
        self.common = common.clamped();
        self.params = params.clamped();
        self.apply_params();
    }

    #[inline]
    fn process(&mut self, sample: f32) -> f32 {
        self.render(sample, None)
    }

    #[inline]
    fn process_with_envelope(&mut self, sample: f32, envelope: f32) -> f32 {
        self.render(sample, Some(envelope.max(0.0)))
    }

    fn reset(&mut self) {
        self.tone.reset();
        self.dc.reset();
        self.hold_countdown = 0.0;
        self.held = 0.0;
        self.envelope.reset();
        self.ring_phase = 0.0;
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.allpass_x1 = 0.0;
        self.allpass_y1 = 0.0;
        self.loop_out = 0.0;
        self.lorenz = LORENZ_START;
        for f in self.formants.iter_mut() {
            f.reset();
        }
        self.split.reset();
        self.grains = [
            Grain::default(),
            Grain {
                age: self.grain_len / 2,
                read_pos: 0,
            },
        ];
        self.noise.reset();
        self.drift = 0.0;
    }

    fn family(&self) -> DistortionFamily {
        self.kind.family()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::OscillatorBlock;

    fn prepared(kind: DistortionType, drive: f32) -> Waveshaper {
        let mut shaper = Waveshaper::default();
        shaper.prepare(48_000.0, 512);
        shaper.configure(
            kind,
            &CommonParams::new(drive, 1.0, 8000.0),
            &TypeParams::default(),
        );
        shaper
    }

    fn render_sine(shaper: &mut Waveshaper, len: usize) -> Vec<f32> {
        let mut osc = OscillatorBlock::sine(220.0, 48_000.0);
        (0..len).map(|_| shaper.process(osc.next_sample() * 0.8)).collect()
    }

    #[test]
    fn test_every_type_is_finite_and_bounded() {
        for kind in DistortionType::ALL {
            let mut shaper = prepared(kind, 4.0);
            let out = render_sine(&mut shaper, 9_600);
            assert!(
                out.iter().all(|s| s.is_finite() && s.abs() <= 4.0),
                "{kind} produced an out-of-range sample"
            );
            assert!(
                out.iter().any(|s| s.abs() > 1e-3),
                "{kind} produced silence"
            );
        }
    }

    #[test]
    fn test_family_follows_configured_type() {
        let mut shaper = prepared(DistortionType::SoftClip, 2.0);
        assert_eq!(shaper.family(), DistortionFamily::Saturation);
        shaper.configure(
            DistortionType::Chaos,
            &CommonParams::default(),
            &TypeParams::default(),
        );
        assert_eq!(shaper.family(), DistortionFamily::Experimental);
    }

    #[test]
    fn test_zero_mix_passes_dry_signal() {
        let mut shaper = prepared(DistortionType::Fuzz, 8.0);
        shaper.configure(
            DistortionType::Fuzz,
            &CommonParams::new(8.0, 0.0, 8000.0),
            &TypeParams::default(),
        );
        for &x in &[0.5, -0.25, 0.1] {
            assert!((shaper.process(x) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reset_replays_identically() {
        for kind in [
            DistortionType::Stochastic,
            DistortionType::Granular,
            DistortionType::FeedbackDist,
            DistortionType::Chaos,
        ] {
            let mut shaper = prepared(kind, 3.0);
            let first = render_sine(&mut shaper, 4_096);
            shaper.reset();
            let second = render_sine(&mut shaper, 4_096);
            assert_eq!(first, second, "{kind} not deterministic after reset");
        }
    }

    #[test]
    fn test_configure_keeps_history() {
        let mut shaper = prepared(DistortionType::FeedbackDist, 2.0);
        render_sine(&mut shaper, 1_000);
        let before = shaper.buffer.iter().filter(|s| **s != 0.0).count();
        shaper.configure(
            DistortionType::FeedbackDist,
            &CommonParams::new(3.0, 1.0, 5000.0),
            &TypeParams {
                feedback: 0.2,
                ..TypeParams::default()
            },
        );
        let after = shaper.buffer.iter().filter(|s| **s != 0.0).count();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unprepared_buffer_types_do_not_panic() {
        let mut shaper = Waveshaper::default();
        for kind in [DistortionType::FeedbackDist, DistortionType::Granular] {
            shaper.configure(kind, &CommonParams::default(), &TypeParams::default());
            assert!(shaper.process(0.5).is_finite());
        }
    }

    #[test]
    fn test_non_finite_input_is_silenced() {
        let mut shaper = prepared(DistortionType::Tube, 3.0);
        assert_eq!(shaper.process(f32::NAN), 0.0);
        assert!(shaper.process(0.3).is_finite());
    }

    #[test]
    fn test_external_envelope_drives_temporal() {
        let mut quiet = prepared(DistortionType::Temporal, 1.0);
        let mut loud = prepared(DistortionType::Temporal, 1.0);
        let a = quiet.process_with_envelope(0.3, 0.0);
        let b = loud.process_with_envelope(0.3, 1.0);
        assert!(b > a, "higher envelope should push harder: {a} vs {b}");
    }
}
