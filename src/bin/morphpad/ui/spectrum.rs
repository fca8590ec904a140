//! Spectrum analyzer widget
//!
//! Hann-windowed FFT read out at log-spaced frequencies, plotted against
//! log10(frequency) so each octave gets the same width. Magnitudes fall back
//! slowly so harmonics appearing mid-morph stay visible.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Points plotted across the band
const POINTS: usize = 64;
const MIN_HZ: f32 = 30.0;
const FLOOR_DB: f64 = -90.0;
/// dB the display may fall per update
const FALL_DB: f64 = 1.5;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin read for each plotted point
    bins: Vec<usize>,
    /// (log10 Hz, dB) per point
    points: Vec<(f64, f64)>,
    /// Window gain, so a full-scale sine reads about 0 dB
    norm: f32,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);

        let window: Vec<f32> = (0..size)
            .map(|i| {
                0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / (size - 1) as f32).cos())
            })
            .collect();
        let norm = window.iter().sum::<f32>() * 0.5;

        let max_hz = (sample_rate * 0.5).min(20_000.0).max(MIN_HZ * 2.0);
        let last_bin = size / 2 - 1;
        let mut bins = Vec::with_capacity(POINTS);
        let mut points = Vec::with_capacity(POINTS);
        for i in 0..POINTS {
            let t = i as f32 / (POINTS - 1) as f32;
            let hz = MIN_HZ * (max_hz / MIN_HZ).powf(t);
            let bin = ((hz * size as f32 / sample_rate).round() as usize).clamp(1, last_bin);
            bins.push(bin);
            points.push(((hz as f64).log10(), FLOOR_DB));
        }

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); size],
            bins,
            points,
            norm,
        }
    }

    /// Analyze the latest `samples`. Shorter buffers are zero padded.
    pub fn update(&mut self, samples: &[f32]) {
        let tail = &samples[samples.len().saturating_sub(self.window.len())..];
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let s = tail.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (point, &bin) in self.points.iter_mut().zip(&self.bins) {
            let magnitude = (self.scratch[bin].norm() / self.norm).max(1e-6);
            let db = (20.0 * magnitude.log10()) as f64;
            point.1 = db.max(point.1 - FALL_DB).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.points
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &SpectrumAnalyzer) {
    let data = spectrum.data();
    let (lo, hi) = match (data.first(), data.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => (1.0, 4.0),
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(data);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(" Spectrum ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([lo, hi])
                .labels(vec!["30", "300", "3k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 6.0])
                .labels(vec!["-90", "-60", "-30", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
