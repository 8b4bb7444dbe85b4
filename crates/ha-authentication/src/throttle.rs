//! Failed-PIN throttling
//!
//! After `max_failed_attempts` consecutive wrong PINs a house or member is
//! locked for `lockout`. A correct PIN clears the counter.

use crate::AuthenticationError;
use ha_core::Timestamp;
use ha_store::{HouseRecord, UserRecord};
use std::time::Duration;

/// Anything carrying a failure counter and a lock deadline
pub trait Lockable {
    fn failed_attempts_mut(&mut self) -> &mut u32;
    fn locked_until_mut(&mut self) -> &mut Option<Timestamp>;
    fn locked_until(&self) -> Option<Timestamp>;
}

impl Lockable for HouseRecord {
    fn failed_attempts_mut(&mut self) -> &mut u32 {
        &mut self.failed_attempts
    }

    fn locked_until_mut(&mut self) -> &mut Option<Timestamp> {
        &mut self.locked_until
    }

    fn locked_until(&self) -> Option<Timestamp> {
        self.locked_until
    }
}

impl Lockable for UserRecord {
    fn failed_attempts_mut(&mut self) -> &mut u32 {
        &mut self.failed_attempts
    }

    fn locked_until_mut(&mut self) -> &mut Option<Timestamp> {
        &mut self.locked_until
    }

    fn locked_until(&self) -> Option<Timestamp> {
        self.locked_until
    }
}

/// Lockout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub max_failed_attempts: u32,
    pub lockout: Duration,
}

impl Throttle {
    pub fn new(max_failed_attempts: u32, lockout: Duration) -> Self {
        Self {
            max_failed_attempts: max_failed_attempts.max(1),
            lockout,
        }
    }

    /// Fail with `Locked` while a lock is in force
    pub fn check(&self, target: &impl Lockable, now: Timestamp) -> Result<(), AuthenticationError> {
        match target.locked_until() {
            Some(until) if now < until => Err(AuthenticationError::Locked {
                retry_after_secs: until.since(now).as_secs().max(1),
            }),
            _ => Ok(()),
        }
    }

    /// Count a wrong PIN; returns `true` when this failure triggered a lock
    pub fn record_failure(&self, target: &mut impl Lockable, now: Timestamp) -> bool {
        let attempts = target.failed_attempts_mut();
        *attempts += 1;
        if *attempts >= self.max_failed_attempts {
            *attempts = 0;
            *target.locked_until_mut() = Some(now.plus(self.lockout));
            true
        } else {
            false
        }
    }

    /// Clear the counter and any expired lock
    pub fn record_success(&self, target: &mut impl Lockable) {
        *target.failed_attempts_mut() = 0;
        *target.locked_until_mut() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_core::HouseId;
    use ha_store::PinHash;

    fn house() -> HouseRecord {
        HouseRecord {
            id: HouseId::new(),
            name: "h".into(),
            code: "h".into(),
            pin_hash: PinHash {
                salt: String::new(),
                digest: String::new(),
            },
            created_at: Timestamp::EPOCH,
            failed_attempts: 0,
            locked_until: None,
        }
    }

    #[test]
    fn test_locks_after_limit_and_expires() {
        let throttle = Throttle::new(3, Duration::from_secs(60));
        let mut h = house();
        let now = Timestamp::from_secs(1_000);
        assert!(!throttle.record_failure(&mut h, now));
        assert!(!throttle.record_failure(&mut h, now));
        assert!(throttle.record_failure(&mut h, now));

        match throttle.check(&h, Timestamp::from_secs(1_030)) {
            Err(AuthenticationError::Locked { retry_after_secs }) => {
                assert_eq!(retry_after_secs, 30);
            }
            other => panic!("expected lock, got {other:?}"),
        }
        assert!(throttle.check(&h, Timestamp::from_secs(1_060)).is_ok());
    }

    #[test]
    fn test_success_resets() {
        let throttle = Throttle::new(2, Duration::from_secs(60));
        let mut h = house();
        throttle.record_failure(&mut h, Timestamp::EPOCH);
        throttle.record_success(&mut h);
        assert_eq!(h.failed_attempts, 0);
        assert!(!throttle.record_failure(&mut h, Timestamp::EPOCH));
    }
}
