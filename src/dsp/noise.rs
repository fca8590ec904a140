/// Xorshift32 white noise.
///
/// Deterministic for a given seed, which keeps randomized processors
/// reproducible across `reset()`.
#[derive(Debug, Clone, Copy)]
pub struct Noise {
    seed: u32,
    state: u32,
}

impl Noise {
    pub fn new(seed: u32) -> Self {
        // Xorshift has a fixed point at zero
        let seed = if seed == 0 { 0x9E37_79B9 } else { seed };
        Self { seed, state: seed }
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn next_unipolar(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in `[-1, 1)`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_unipolar() * 2.0 - 1.0
    }

    /// Restart the sequence from the original seed.
    pub fn reset(&mut self) {
        self.state = self.seed;
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::new(0x1234_5678)
    }
}
