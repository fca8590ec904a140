use std::f32::consts::{PI, TAU};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::sanitize::clamp_finite, MIN_SAMPLE_RATE};

/*
| type              | constructed by       | passes          | rejects      |
| ----------------- | -------------------- | --------------- | ------------ |
| low-pass          | LPF                  | below cutoff    | above cutoff |
| band-pass         | LPF ∘ HPF (series)   | between cutoffs | outside      |

Distortion processors use the state-variable filter for their tone control
(low-pass after the waveshaper) and for formant and band-split effects.
Coefficients are recomputed only when cutoff, resonance or sample rate change,
so per-sample cost is a handful of multiplies.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    BandPass,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
}

#[derive(Debug, Clone)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    cutoff_hz: f32,
    resonance: f32,
    sample_rate: f32,
    g: f32,
    k: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance: 0.0,
            sample_rate: sample_rate.max(MIN_SAMPLE_RATE),
            g: 0.0,
            k: 2.0,
            filter_type,
        };
        filter.update_coefficients();
        filter
    }

    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz, sample_rate)
    }

    pub fn bandpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterType::BandPass, cutoff_hz, sample_rate)
    }

    fn update_coefficients(&mut self) {
        // Keep the prewarp away from Nyquist where tan() blows up
        let max_cutoff = self.sample_rate * 0.49;
        self.cutoff_hz = clamp_finite(self.cutoff_hz, 10.0, max_cutoff);
        let wd = TAU * self.cutoff_hz;
        let wa = (2.0 * self.sample_rate) * (wd / (2.0 * self.sample_rate)).tan();
        self.g = wa / (2.0 * self.sample_rate);
        self.k = 2.0 - (2.0 * self.resonance);
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> FilterOutputs {
        let (g, k) = (self.g, self.k);
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let outputs = self.next_sample(sample);
        match self.filter_type {
            FilterType::LowPass => outputs.lowpass,
            FilterType::BandPass => outputs.bandpass,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(MIN_SAMPLE_RATE);
        self.update_coefficients();
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        if cutoff != self.cutoff_hz {
            self.cutoff_hz = cutoff;
            self.update_coefficients();
        }
    }

    /// Resonance in `[0, 0.98]`; higher values self-oscillate.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = clamp_finite(resonance, 0.0, 0.98);
        self.update_coefficients();
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }
}

/// First-order DC blocker: `y[n] = x[n] - x[n-1] + r × y[n-1]`.
///
/// Rectifiers and asymmetric shapers add a DC offset that would otherwise eat
/// headroom downstream.
#[derive(Debug, Clone, Copy)]
pub struct DcBlocker {
    r: f32,
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    pub fn new(sample_rate: f32) -> Self {
        let mut blocker = Self {
            r: 0.995,
            x1: 0.0,
            y1: 0.0,
        };
        blocker.set_sample_rate(sample_rate);
        blocker
    }

    /// Corner around 10 Hz regardless of rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.r = 1.0 - (2.0 * PI * 10.0 / sample_rate.max(MIN_SAMPLE_RATE));
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let y = sample - self.x1 + self.r * self.y1;
        self.x1 = sample;
        self.y1 = y;
        y
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(256);
        buffer
            .get(skip..)
            .unwrap_or(buffer)
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn test_lowpass_basic() {
        let mut filter = SVFilter::lowpass(500.0, 48_000.0);
        let mut buffer = vec![1.0; 512];

        filter.render(&mut buffer);

        assert!(buffer[511] > 0.99);
    }

    #[test]
    fn test_lowpass_filters_high_freq() {
        let mut filter = SVFilter::lowpass(500.0, 48_000.0);
        let mut buffer = sine(5_000.0, 48_000.0, 1024);

        filter.render(&mut buffer);

        let peak = peak_after_transient(&buffer);
        assert!(
            peak < 0.3,
            "Expected high freq attenuation, got peak: {}",
            peak
        );
    }

    #[test]
    fn test_bandpass_emphasizes_cutoff_frequency() {
        let sample_rate = 48_000.0;
        let mut filter = SVFilter::bandpass(1_000.0, sample_rate);
        filter.set_resonance(0.5);

        let mut pass = sine(1_000.0, sample_rate, 2048);
        filter.render(&mut pass);
        let pass_peak = peak_after_transient(&pass);

        filter.reset();
        let mut off = sine(100.0, sample_rate, 2048);
        filter.render(&mut off);
        let off_peak = peak_after_transient(&off);

        assert!(
            pass_peak > off_peak * 2.0,
            "expected bandpass to emphasize cutoff freq, got pass_peak={}, off_peak={}",
            pass_peak,
            off_peak
        );
    }

    #[test]
    fn test_cutoff_is_clamped_below_nyquist() {
        let mut filter = SVFilter::lowpass(1_000.0, 48_000.0);
        filter.set_cutoff(100_000.0);
        assert!(filter.cutoff() < 24_000.0);

        let mut buffer = sine(440.0, 48_000.0, 256);
        filter.render(&mut buffer);
        assert!(buffer.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_dc_blocker_removes_offset() {
        let mut blocker = DcBlocker::new(48_000.0);
        let mut last = 1.0;
        for _ in 0..48_000 {
            last = blocker.process(0.5);
        }
        assert!(last.abs() < 1e-3);
    }
}
