//! morphpad - Terminal morph pad
//!
//! Plays a test tone through a morph engine and lets you drag the cursor
//! around the node square.
//!
//! Run with: cargo run --bin morphpad -- [node types...]
//!
//! e.g. `cargo run --bin morphpad -- tube sine-fold bitcrush chaos`

mod app;
mod ui;

use app::MorphPad;
use morph_dsp::distortion::DistortionType;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let kinds = std::env::args()
        .skip(1)
        .map(|arg| arg.parse::<DistortionType>())
        .collect::<Result<Vec<_>, _>>()?;

    MorphPad::new().nodes(&kinds).tone_hz(110.0).run()
}
