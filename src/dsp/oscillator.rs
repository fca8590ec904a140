use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::noise::Noise, MIN_SAMPLE_RATE};

/// Test and modulation source waveforms.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Saw,
    Square,
    Noise,
}

/// Naive (non-band-limited) phase-accumulator oscillator.
///
/// Used for test tones and carrier signals, not as a synth voice, so aliasing
/// on saw/square is acceptable.
#[derive(Debug, Clone)]
pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
    increment: f32,
    noise: Noise,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform, frequency: f32, sample_rate: f32) -> Self {
        let mut osc = Self {
            waveform,
            phase: 0.0,
            increment: 0.0,
            noise: Noise::default(),
        };
        osc.set_frequency(frequency, sample_rate);
        osc
    }

    pub fn sine(frequency: f32, sample_rate: f32) -> Self {
        Self::new(OscillatorWaveform::Sine, frequency, sample_rate)
    }

    pub fn saw(frequency: f32, sample_rate: f32) -> Self {
        Self::new(OscillatorWaveform::Saw, frequency, sample_rate)
    }

    pub fn set_frequency(&mut self, frequency: f32, sample_rate: f32) {
        let nyquist = sample_rate.max(MIN_SAMPLE_RATE) * 0.5;
        self.increment = frequency.clamp(0.0, nyquist) / sample_rate.max(MIN_SAMPLE_RATE);
    }

    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.waveform = waveform;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let phase = self.phase;
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        match self.waveform {
            OscillatorWaveform::Sine => (phase * TAU).sin(),
            OscillatorWaveform::Saw => 2.0 * phase - 1.0,
            OscillatorWaveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscillatorWaveform::Noise => self.noise.next_bipolar(),
        }
    }

    pub fn render(&mut self, destination: &mut [f32]) {
        for sample in destination.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.noise.reset();
    }
}
