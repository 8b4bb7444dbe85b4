//! HomeAsisstan Authentication
//!
//! Proves WHO is calling, in three steps:
//!
//! 1. **House PIN** → short-lived house token and the list of selectable members
//! 2. **Member PIN** (with the house token) → access + refresh token pair backed
//!    by a session record, or an activation token when the member still holds
//!    a temporary PIN
//! 3. **Activation** (with the activation token) → personal PIN set, session issued
//!
//! Refresh tokens rotate on every use; presenting a superseded one revokes the
//! session. What an authenticated member may do is decided by
//! `ha-authorization`.

#![allow(missing_docs)]

pub mod config;
pub mod pin;
pub mod service;
pub mod throttle;
pub mod token;
pub mod types;

pub use config::AuthConfig;
pub use pin::{validate_personal_pin, validate_pin, PinHasher};
pub use service::AuthService;
pub use throttle::Throttle;
pub use token::{token_digest, TokenClaims, TokenCodec, TokenError, TokenKind};
pub use types::{
    HouseLogin, HouseSummary, LoginOutcome, MemberSummary, SessionTokens, TemporaryPin,
};

use ha_core::{HaError, Role};

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid house code or PIN")]
    InvalidHouseCredentials,

    #[error("Invalid PIN")]
    InvalidPin,

    #[error("Too many failed attempts, retry in {retry_after_secs}s")]
    Locked { retry_after_secs: u64 },

    #[error("Invalid token: {0}")]
    Token(#[from] TokenError),

    #[error("Activation token already used")]
    ActivationTokenUsed,

    #[error("PIN was replaced while logging in, start again")]
    CredentialChanged,

    #[error("Session revoked")]
    SessionRevoked,

    #[error("Session expired")]
    SessionExpired,

    #[error("Refresh token reuse detected, session revoked")]
    RefreshTokenReuse,

    #[error("Account is deactivated")]
    AccountInactive,

    #[error("Role {0} cannot log in")]
    CannotAuthenticate(Role),

    #[error("No PIN has been issued for this member")]
    NoCredential,

    #[error("Temporary PIN expired")]
    TemporaryPinExpired,

    #[error("Member already activated")]
    AlreadyActivated,

    #[error("Weak PIN: {0}")]
    WeakPin(String),

    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl From<AuthenticationError> for HaError {
    fn from(err: AuthenticationError) -> Self {
        match err {
            AuthenticationError::Locked { retry_after_secs } => {
                HaError::locked(err.to_string(), retry_after_secs)
            }
            AuthenticationError::CannotAuthenticate(_) => {
                HaError::permission_denied(err.to_string())
            }
            AuthenticationError::AlreadyActivated => HaError::conflict(err.to_string()),
            AuthenticationError::WeakPin(_) => HaError::invalid(err.to_string()),
            AuthenticationError::Crypto(_) => HaError::crypto(err.to_string()),
            _ => HaError::unauthorized(err.to_string()),
        }
    }
}

impl From<TokenError> for HaError {
    fn from(err: TokenError) -> Self {
        AuthenticationError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            HaError::from(AuthenticationError::Locked {
                retry_after_secs: 5
            }),
            HaError::Locked {
                retry_after_secs: 5,
                ..
            }
        ));
        assert!(matches!(
            HaError::from(TokenError::BadSignature),
            HaError::Unauthorized { .. }
        ));
        assert!(matches!(
            HaError::from(AuthenticationError::WeakPin("x".into())),
            HaError::Invalid { .. }
        ));
    }
}
