use crate::frame::types::Frame;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Produces pseudorandom payload frames.
///
/// One generator owns one RNG stream for the whole session, so frames drawn
/// one after another never restart the same sequence.
pub struct FrameGenerator {
    rng: StdRng,
}

impl Default for FrameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGenerator {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible generator for replaying a run
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a frame of exactly `size` uniformly distributed bytes
    pub fn generate(&mut self, size: usize) -> Frame {
        let mut data = vec![0u8; size];
        self.rng.fill_bytes(&mut data);
        Frame::from(data)
    }
}
