//! Authentication settings
//!
//! Loaded as the `[auth]` table of the server configuration. Durations are
//! plain seconds so the TOML stays readable.

use crate::throttle::Throttle;
use ha_core::{HaError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest accepted token secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Authentication settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC key for tokens; also derives the PIN pepper
    pub token_secret: String,
    pub house_token_ttl_secs: u64,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub activation_token_ttl_secs: u64,
    pub temporary_pin_ttl_secs: u64,
    pub temporary_pin_length: usize,
    pub max_failed_attempts: u32,
    pub lockout_secs: u64,
    pub pin_hash_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            house_token_ttl_secs: 5 * 60,
            access_token_ttl_secs: 15 * 60,
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            activation_token_ttl_secs: 10 * 60,
            temporary_pin_ttl_secs: 72 * 60 * 60,
            temporary_pin_length: 6,
            max_failed_attempts: 5,
            lockout_secs: 15 * 60,
            pin_hash_iterations: 10_000,
        }
    }
}

impl AuthConfig {
    pub fn house_token_ttl(&self) -> Duration {
        Duration::from_secs(self.house_token_ttl_secs)
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }

    pub fn activation_token_ttl(&self) -> Duration {
        Duration::from_secs(self.activation_token_ttl_secs)
    }

    pub fn temporary_pin_ttl(&self) -> Duration {
        Duration::from_secs(self.temporary_pin_ttl_secs)
    }

    pub fn throttle(&self) -> Throttle {
        Throttle::new(
            self.max_failed_attempts,
            Duration::from_secs(self.lockout_secs),
        )
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.token_secret.len() < MIN_SECRET_LEN {
            return Err(HaError::invalid(format!(
                "auth.token_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        let ttls = [
            ("house_token_ttl_secs", self.house_token_ttl_secs),
            ("access_token_ttl_secs", self.access_token_ttl_secs),
            ("refresh_token_ttl_secs", self.refresh_token_ttl_secs),
            ("activation_token_ttl_secs", self.activation_token_ttl_secs),
            ("temporary_pin_ttl_secs", self.temporary_pin_ttl_secs),
            ("lockout_secs", self.lockout_secs),
        ];
        if let Some((name, _)) = ttls.iter().find(|(_, secs)| *secs == 0) {
            return Err(HaError::invalid(format!("auth.{name} must be positive")));
        }
        if self.access_token_ttl_secs >= self.refresh_token_ttl_secs {
            return Err(HaError::invalid(
                "auth.access_token_ttl_secs must be shorter than the refresh window",
            ));
        }
        if !(crate::pin::MIN_PIN_LEN..=crate::pin::MAX_PIN_LEN)
            .contains(&self.temporary_pin_length)
        {
            return Err(HaError::invalid(
                "auth.temporary_pin_length must be between 4 and 8",
            ));
        }
        if self.max_failed_attempts == 0 || self.pin_hash_iterations == 0 {
            return Err(HaError::invalid(
                "auth.max_failed_attempts and auth.pin_hash_iterations must be positive",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"<redacted>")
            .field("house_token_ttl_secs", &self.house_token_ttl_secs)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("activation_token_ttl_secs", &self.activation_token_ttl_secs)
            .field("temporary_pin_ttl_secs", &self.temporary_pin_ttl_secs)
            .field("temporary_pin_length", &self.temporary_pin_length)
            .field("max_failed_attempts", &self.max_failed_attempts)
            .field("lockout_secs", &self.lockout_secs)
            .field("pin_hash_iterations", &self.pin_hash_iterations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AuthConfig {
        AuthConfig {
            token_secret: "s".repeat(MIN_SECRET_LEN),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_defaults_need_a_secret() {
        assert!(AuthConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = AuthConfig {
            activation_token_ttl_secs: 0,
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("activation_token_ttl_secs"));
    }

    #[test]
    fn test_access_must_be_shorter_than_refresh() {
        let config = AuthConfig {
            access_token_ttl_secs: 100,
            refresh_token_ttl_secs: 100,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("ssss"));
        assert!(rendered.contains("<redacted>"));
    }
}
