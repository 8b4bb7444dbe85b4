//! Random effect handler
//!
//! This is the one place allowed to reach for `rand::thread_rng()`.

use async_trait::async_trait;
use ha_core::RandomEffects;
use rand::{Rng, RngCore};

/// Real random handler backed by the thread-local CSPRNG
#[derive(Debug, Clone, Default)]
pub struct RealRandomHandler;

impl RealRandomHandler {
    /// Create a new real random handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RandomEffects for RealRandomHandler {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    async fn random_below(&self, bound: u32) -> u32 {
        rand::thread_rng().gen_range(0..bound.max(1))
    }
}
