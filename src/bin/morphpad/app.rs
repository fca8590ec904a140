//! MorphPad - application builder and audio runner

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;

use morph_dsp::{
    distortion::DistortionType,
    dsp::oscillator::OscillatorBlock,
    morph::{node::default_nodes, MorphEngine, MorphMode, MorphNode, ProcessorBudget},
    MAX_BLOCK_SIZE, MAX_MORPH_NODES, MIN_ACTIVE_NODES,
};

use super::ui::{NodeInfo, PadSnapshot, UiApp};

/// Samples buffered for the scope and spectrum (about 170ms at 48kHz)
const AUDIO_RING_SIZE: usize = 8192;
const SNAPSHOT_RING_SIZE: usize = 32;
const CONTROL_RING_SIZE: usize = 256;

/// Main application builder
pub struct MorphPad {
    nodes: Vec<MorphNode>,
    tone_hz: f32,
    gain: f32,
}

impl MorphPad {
    /// Four default nodes at the corners, 110 Hz saw
    pub fn new() -> Self {
        Self {
            nodes: default_nodes().to_vec(),
            tone_hz: 110.0,
            gain: 0.5,
        }
    }

    /// Replace the node types. Fewer than two keeps the defaults for the
    /// remaining slots; extras beyond four are ignored.
    pub fn nodes(mut self, kinds: &[DistortionType]) -> Self {
        if kinds.is_empty() {
            return self;
        }
        let count = kinds.len().clamp(MIN_ACTIVE_NODES, MAX_MORPH_NODES);
        let defaults = default_nodes();
        self.nodes = (0..count)
            .map(|slot| {
                let kind = kinds
                    .get(slot)
                    .copied()
                    .unwrap_or(defaults[slot].distortion_type);
                MorphNode::new(slot as u8, kind)
            })
            .collect();
        self
    }

    pub fn tone_hz(mut self, hz: f32) -> Self {
        self.tone_hz = hz;
        self
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        // === ENGINE ===
        let budget = ProcessorBudget::shared();
        let mut engine = MorphEngine::new(budget);
        engine.prepare(sample_rate, MAX_BLOCK_SIZE);
        engine.set_nodes(&self.nodes);
        engine.set_active_node_count(self.nodes.len());
        let mode = if self.nodes.len() > MIN_ACTIVE_NODES {
            MorphMode::Planar2D
        } else {
            MorphMode::Linear1D
        };
        engine.set_mode(mode);
        engine.set_morph_position(0.5, 0.5);

        let controller = engine.control_channel(CONTROL_RING_SIZE);
        let (mut audio_tx, audio_rx) = RingBuffer::<f32>::new(AUDIO_RING_SIZE);
        let (mut snapshot_tx, snapshot_rx) = RingBuffer::<PadSnapshot>::new(SNAPSHOT_RING_SIZE);

        let nodes: Vec<NodeInfo> = engine
            .nodes()
            .iter()
            .take(engine.active_node_count())
            .map(NodeInfo::from)
            .collect();
        let initial = PadSnapshot::capture(&engine);

        // === AUDIO ===
        let mut osc = OscillatorBlock::saw(self.tone_hz, sample_rate);
        let mut block = [0.0f32; MAX_BLOCK_SIZE];
        let gain = self.gain;

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut block[..frames];

                    osc.render(block);
                    for s in block.iter_mut() {
                        *s *= gain;
                    }
                    engine.process_block(block);

                    // Mono to all channels; the scope just drops samples when full
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                        let _ = audio_tx.push(s);
                    }

                    frames_written += frames;
                }

                let _ = snapshot_tx.push(PadSnapshot::capture(&engine));
            },
            |err| eprintln!("Audio error: {}", err),
            None,
        )?;

        stream.play()?;

        // === UI ===
        let mut terminal = ratatui::init();
        let mut app = UiApp::new(audio_rx, snapshot_rx, controller, nodes, initial, sample_rate);
        let result = app.run(&mut terminal);
        ratatui::restore();

        drop(stream);
        result
    }
}

impl Default for MorphPad {
    fn default() -> Self {
        Self::new()
    }
}
