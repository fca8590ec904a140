//! Whole-engine benchmarks.
//!
//! These model how the plugin actually runs engines: one per band, all
//! drawing from a single processor budget.

mod bands;
mod paths;

pub use bands::bench_bands;
pub use paths::bench_paths;
