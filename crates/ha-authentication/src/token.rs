//! Signed token codec
//!
//! Tokens are `base64url(claims json) "." base64url(hmac-sha256)`, keyed by the
//! server secret. Every token names its [`TokenKind`], so a house token can never
//! stand in for an access token even though they share a key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ha_core::{HouseId, Role, SessionId, Timestamp, UserId};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Token codec errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("expected {expected:?} token, got {found:?}")]
    WrongKind { expected: TokenKind, found: TokenKind },
    #[error("{0:?} token expired")]
    Expired(TokenKind),
    #[error("token key rejected: {0}")]
    Key(String),
}

/// What a token proves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// The house PIN was verified; allows member selection and PIN login
    House,
    /// Short-lived API credential
    Access,
    /// Long-lived credential that mints new access tokens
    Refresh,
    /// One-time permission to replace a temporary PIN
    Activation,
}

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub kind: TokenKind,
    /// Member, absent on house tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<UserId>,
    pub hid: HouseId,
    /// Session, present on access and refresh tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub iat: Timestamp,
    pub exp: Timestamp,
    /// Random id; makes every token unique and lets one-time tokens be spent
    pub jti: String,
    /// Fingerprint of the temporary PIN an activation token was issued against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred: Option<String>,
}

impl TokenClaims {
    /// Subject, or a malformed-token error when absent
    pub fn subject(&self) -> Result<UserId, TokenError> {
        self.sub.ok_or(TokenError::Malformed)
    }

    /// Session, or a malformed-token error when absent
    pub fn session(&self) -> Result<SessionId, TokenError> {
        self.sid.ok_or(TokenError::Malformed)
    }
}

/// Encodes and verifies tokens with one HMAC key
#[derive(Clone)]
pub struct TokenCodec {
    key: Vec<u8>,
}

impl TokenCodec {
    /// Build a codec; the secret must not be empty
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Key("empty secret".into()));
        }
        Ok(Self {
            key: secret.to_vec(),
        })
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| TokenError::Key(e.to_string()))
    }

    /// Sign claims into a compact token
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
        let body = URL_SAFE_NO_PAD.encode(payload);
        let mut mac = self.mac()?;
        mac.update(body.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{body}.{signature}"))
    }

    /// Verify signature, kind and expiry
    pub fn decode(
        &self,
        token: &str,
        expected: TokenKind,
        now: Timestamp,
    ) -> Result<TokenClaims, TokenError> {
        let (body, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(body.as_bytes());
        let expected_sig = mac.finalize().into_bytes();
        if !bool::from(expected_sig.as_slice().ct_eq(&signature)) {
            return Err(TokenError::BadSignature);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| TokenError::Malformed)?;
        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                found: claims.kind,
            });
        }
        if now >= claims.exp {
            return Err(TokenError::Expired(claims.kind));
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

/// Hex SHA-256 of a token, as stored on the session for refresh rotation
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
