//! Deterministic random streams.
//!
//! Each [`Stream`] is an independent ChaCha sequence derived from the session
//! seed, a stage label and an epoch (the number of resets the session has
//! gone through). Climate drift, floods and reclaims each draw from their own
//! stream, so adding draws to one stage never perturbs another.

use rand::{Error, RngCore};
use rand_chacha::ChaCha8Rng;
use rand_seeder::Seeder;

#[derive(Clone, Debug)]
pub struct Stream {
    inner: ChaCha8Rng,
}

impl Stream {
    /// Construct a stream for the given `(seed, stage, epoch)` triple.
    pub fn from(seed: u64, stage: &str, epoch: u64) -> Self {
        let inner = Seeder::from((seed, stage, epoch)).make_rng::<ChaCha8Rng>();
        Self { inner }
    }
}

impl RngCore for Stream {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.inner.try_fill_bytes(dest)
    }
}
