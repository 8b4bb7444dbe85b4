//! Seeded randomness

use async_trait::async_trait;
use ha_core::RandomEffects;
use parking_lot::Mutex;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;

/// ChaCha20 stream with a fixed seed; same seed, same values
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
        }
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::new(42)
    }
}

#[async_trait]
impl RandomEffects for SeededRandom {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        self.rng.lock().fill_bytes(&mut bytes);
        bytes
    }

    async fn random_below(&self, bound: u32) -> u32 {
        self.rng.lock().gen_range(0..bound.max(1))
    }
}
