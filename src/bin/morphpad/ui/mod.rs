//! TUI module for morphpad
//!
//! Draws the pad, weight bars, scope and spectrum, and turns key presses into
//! engine messages.

mod pad;
mod spectrum;
pub mod state;
mod waveform;
mod weights;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use std::time::Duration;

use morph_dsp::morph::{ControlContext, MorphController};

pub use state::{NodeInfo, PadSnapshot};

use pad::{render_pad, status_style};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use waveform::render_waveform;
use weights::render_weights;

/// Samples kept for the scope and the FFT
const VIS_BUFFER_SIZE: usize = 2048;
/// Cursor movement per arrow key press
const CURSOR_STEP: f32 = 0.05;
const SMOOTHING_STEP_MS: f32 = 10.0;

/// UI application state
pub struct UiApp {
    audio_rx: Consumer<f32>,
    snapshot_rx: Consumer<PadSnapshot>,
    controller: MorphController,
    nodes: Vec<NodeInfo>,
    /// Latest snapshot from the audio thread
    snapshot: PadSnapshot,
    /// Cursor as requested by the keyboard
    target: (f32, f32),
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    /// Messages the queue rejected since the last successful send
    dropped: usize,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        audio_rx: Consumer<f32>,
        snapshot_rx: Consumer<PadSnapshot>,
        controller: MorphController,
        nodes: Vec<NodeInfo>,
        initial: PadSnapshot,
        sample_rate: f32,
    ) -> Self {
        Self {
            audio_rx,
            snapshot_rx,
            controller,
            nodes,
            snapshot: initial,
            target: initial.cursor,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, sample_rate),
            dropped: 0,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_snapshots();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn poll_audio(&mut self) {
        let mut received = false;
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.push(sample);
            received = true;
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
        if received {
            self.spectrum.update(&self.audio_buffer);
        }
    }

    /// Keep only the latest snapshot
    fn poll_snapshots(&mut self) {
        while let Ok(snapshot) = self.snapshot_rx.pop() {
            self.snapshot = snapshot;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let (x, y) = self.target;
        let sent = match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                Ok(())
            }
            KeyCode::Left => self.move_cursor(x - CURSOR_STEP, y),
            KeyCode::Right => self.move_cursor(x + CURSOR_STEP, y),
            KeyCode::Up => self.move_cursor(x, y + CURSOR_STEP),
            KeyCode::Down => self.move_cursor(x, y - CURSOR_STEP),
            KeyCode::Char('m') => self.controller.set_mode(self.snapshot.mode.next()),
            KeyCode::Char('a') => {
                let context = match self.snapshot.context {
                    ControlContext::Manual => ControlContext::Automated,
                    ControlContext::Automated => ControlContext::Manual,
                };
                self.controller.set_control_context(context)
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self
                .controller
                .set_smoothing_time_ms(self.snapshot.smoothing_ms + SMOOTHING_STEP_MS),
            KeyCode::Char('-') => self
                .controller
                .set_smoothing_time_ms(self.snapshot.smoothing_ms - SMOOTHING_STEP_MS),
            KeyCode::Char('r') | KeyCode::Char('R') => self.controller.reset(),
            _ => Ok(()),
        };
        match sent {
            Ok(()) => self.dropped = 0,
            Err(_) => self.dropped += 1,
        }
    }

    fn move_cursor(&mut self, x: f32, y: f32) -> Result<(), morph_dsp::morph::MorphMessage> {
        self.target = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
        self.controller.set_position(self.target.0, self.target.1)
    }

    fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(12),   // Pad + weights
                Constraint::Length(10), // Scope + spectrum
                Constraint::Length(1),  // Status
                Constraint::Length(1),  // Help
            ])
            .split(frame.area());

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[0]);
        render_pad(frame, top[0], &self.nodes, self.target, &self.snapshot);
        render_weights(frame, top[1], &self.nodes, &self.snapshot);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        render_waveform(frame, bottom[0], &self.audio_buffer);
        render_spectrum(frame, bottom[1], &self.spectrum);

        let s = &self.snapshot;
        let mut status = format!(
            " {}  |  {} rendered, {} held  |  {:?} {:.0} ms  |  prune {:.3}",
            s.path_label(),
            s.rendered,
            s.granted,
            s.context,
            s.smoothing_ms,
            s.threshold,
        );
        if self.dropped > 0 {
            status.push_str(&format!("  |  queue full ({} dropped)", self.dropped));
        }
        frame.render_widget(Paragraph::new(status).style(status_style(s)), rows[2]);

        let help = Paragraph::new(
            " [Arrows] Move  [M] Mode  [A] Manual/Automated  [+/-] Smoothing  [R] Reset  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[3]);
    }
}
