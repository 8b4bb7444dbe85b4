//! PIN policy and hashing
//!
//! PINs are short, so the digest is keyed with a server-side pepper and
//! iterated. Offline guessing then needs both the database and the server
//! secret; online guessing is bounded by the lockout in [`crate::throttle`].

use crate::AuthenticationError;
use ha_store::PinHash;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Shortest accepted PIN
pub const MIN_PIN_LEN: usize = 4;
/// Longest accepted PIN
pub const MAX_PIN_LEN: usize = 8;

/// Any PIN: 4 to 8 ASCII digits
pub fn validate_pin(pin: &str) -> Result<(), AuthenticationError> {
    if !(MIN_PIN_LEN..=MAX_PIN_LEN).contains(&pin.len()) {
        return Err(AuthenticationError::WeakPin(format!(
            "PIN must have {MIN_PIN_LEN} to {MAX_PIN_LEN} digits"
        )));
    }
    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AuthenticationError::WeakPin(
            "PIN must contain digits only".into(),
        ));
    }
    Ok(())
}

/// A PIN a member chooses for themselves
///
/// Rejects repeated digits (`0000`) and straight runs (`1234`, `8765`).
pub fn validate_personal_pin(pin: &str) -> Result<(), AuthenticationError> {
    validate_pin(pin)?;
    let digits: Vec<i8> = pin.bytes().map(|b| (b - b'0') as i8).collect();
    let steps: Vec<i8> = digits.windows(2).map(|w| w[1] - w[0]).collect();
    if steps.iter().all(|s| *s == 0) {
        return Err(AuthenticationError::WeakPin(
            "PIN must not repeat a single digit".into(),
        ));
    }
    if steps.iter().all(|s| *s == 1) || steps.iter().all(|s| *s == -1) {
        return Err(AuthenticationError::WeakPin(
            "PIN must not be a straight sequence".into(),
        ));
    }
    Ok(())
}

/// Peppered, iterated HMAC-SHA256 PIN hasher
#[derive(Clone)]
pub struct PinHasher {
    pepper: Vec<u8>,
    iterations: u32,
}

impl PinHasher {
    pub fn new(pepper: impl Into<Vec<u8>>, iterations: u32) -> Self {
        Self {
            pepper: pepper.into(),
            iterations: iterations.max(1),
        }
    }

    fn digest(&self, pin: &str, salt: &[u8]) -> Result<Vec<u8>, AuthenticationError> {
        let new_mac = || {
            HmacSha256::new_from_slice(&self.pepper)
                .map_err(|e| AuthenticationError::Crypto(e.to_string()))
        };
        let mut mac = new_mac()?;
        mac.update(salt);
        mac.update(pin.as_bytes());
        let mut state = mac.finalize().into_bytes().to_vec();
        for _ in 1..self.iterations {
            let mut mac = new_mac()?;
            mac.update(&state);
            mac.update(salt);
            state = mac.finalize().into_bytes().to_vec();
        }
        Ok(state)
    }

    /// Hash `pin` under a caller-supplied random salt
    pub fn hash(&self, pin: &str, salt: &[u8]) -> Result<PinHash, AuthenticationError> {
        Ok(PinHash {
            salt: hex::encode(salt),
            digest: hex::encode(self.digest(pin, salt)?),
        })
    }

    /// Constant-time comparison against a stored hash
    pub fn verify(&self, pin: &str, stored: &PinHash) -> Result<bool, AuthenticationError> {
        let salt = hex::decode(&stored.salt)
            .map_err(|e| AuthenticationError::Crypto(format!("stored salt: {e}")))?;
        let expected = hex::decode(&stored.digest)
            .map_err(|e| AuthenticationError::Crypto(format!("stored digest: {e}")))?;
        let actual = self.digest(pin, &salt)?;
        Ok(bool::from(actual.ct_eq(&expected)))
    }
}

impl std::fmt::Debug for PinHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinHasher")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_shape() {
        assert!(validate_pin("0420").is_ok());
        assert!(validate_pin("12345678").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("123456789").is_err());
        assert!(validate_pin("12a4").is_err());
        assert!(validate_pin("١٢٣٤").is_err());
    }

    #[test]
    fn test_personal_pin_rejects_trivial() {
        assert!(validate_personal_pin("1111").is_err());
        assert!(validate_personal_pin("3456").is_err());
        assert!(validate_personal_pin("9876").is_err());
        assert!(validate_personal_pin("1357").is_ok());
        assert!(validate_personal_pin("1123").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = PinHasher::new(b"pepper".to_vec(), 3);
        let stored = hasher.hash("2580", &[7u8; 32]).unwrap();
        assert!(hasher.verify("2580", &stored).unwrap());
        assert!(!hasher.verify("2581", &stored).unwrap());
    }

    #[test]
    fn test_salt_and_pepper_change_digest() {
        let hasher = PinHasher::new(b"pepper".to_vec(), 3);
        let a = hasher.hash("2580", &[1u8; 32]).unwrap();
        let b = hasher.hash("2580", &[2u8; 32]).unwrap();
        assert_ne!(a.digest, b.digest);

        let other = PinHasher::new(b"other".to_vec(), 3);
        assert!(!other.verify("2580", &a).unwrap());
    }

    #[test]
    fn test_iterations_change_digest() {
        let one = PinHasher::new(b"pepper".to_vec(), 1);
        let many = PinHasher::new(b"pepper".to_vec(), 5);
        let salt = [3u8; 32];
        assert_ne!(
            one.hash("2580", &salt).unwrap().digest,
            many.hash("2580", &salt).unwrap().digest
        );
    }
}
