/// Seeded PRNG for level generation.
///
/// PCG-like: a 64-bit LCG step followed by an xorshift and a data-dependent
/// rotation. The sequence depends only on the seed, so a level generated on
/// one device matches the same level on every other device.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let xorshifted = (((self.state >> 18) ^ self.state) >> 27) as u32;
        let rot = (self.state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Draw a value in `min..=max`. An empty range yields `min`.
    pub fn next_in_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as u64;
        min + (u64::from(self.next_u32()) % span) as i64
    }
}
