//! Randomness effect

use async_trait::async_trait;
use std::sync::Arc;

/// Cryptographically secure randomness
#[async_trait]
pub trait RandomEffects: Send + Sync {
    /// Fill a buffer of `len` random bytes
    async fn random_bytes(&self, len: usize) -> Vec<u8>;

    /// Uniform value in `0..bound`; `bound` must be non-zero
    async fn random_below(&self, bound: u32) -> u32;

    /// 32 random bytes, used for salts and token ids
    async fn random_bytes_32(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        let bytes = self.random_bytes(32).await;
        out.copy_from_slice(&bytes[..32]);
        out
    }

    /// A string of `len` uniform decimal digits, used for temporary PINs
    async fn random_digits(&self, len: usize) -> String {
        let mut digits = String::with_capacity(len);
        for _ in 0..len {
            let d = self.random_below(10).await;
            digits.push(char::from(b'0' + d as u8));
        }
        digits
    }
}

#[async_trait]
impl<T: RandomEffects + ?Sized> RandomEffects for Arc<T> {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        (**self).random_bytes(len).await
    }

    async fn random_below(&self, bound: u32) -> u32 {
        (**self).random_below(bound).await
    }
}
