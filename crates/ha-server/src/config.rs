//! Server configuration
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//! session_sweep_secs = 300
//!
//! [auth]
//! token_secret = "…at least 32 bytes…"
//! access_token_ttl_secs = 900
//!
//! [logging]
//! filter = "info,ha_server=debug"
//!
//! [[bootstrap.houses]]
//! name = "Casa Lima"
//! code = "casa-lima"
//! pin = "4826"
//! admin_name = "Ana"
//! ```

use ha_authentication::AuthConfig;
use ha_core::{HaError, RandomEffects, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Environment variable overriding `auth.token_secret`
pub const TOKEN_SECRET_ENV: &str = "HA_TOKEN_SECRET";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    /// Interval of the background sweep marking expired sessions; 0 disables it
    pub session_sweep_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            session_sweep_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive; `RUST_LOG` wins when set
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub houses: Vec<BootstrapHouse>,
}

/// A house created at startup unless its code already exists
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapHouse {
    pub name: String,
    pub code: String,
    pub pin: String,
    pub admin_name: String,
}

impl std::fmt::Debug for BootstrapHouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapHouse")
            .field("name", &self.name)
            .field("code", &self.code)
            .field("pin", &"<redacted>")
            .field("admin_name", &self.admin_name)
            .finish()
    }
}

impl ServerConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            HaError::invalid(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| HaError::invalid(format!("config file {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| HaError::invalid(format!("invalid TOML: {e}")))
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        self.apply_secret_override(std::env::var(TOKEN_SECRET_ENV).ok());
    }

    fn apply_secret_override(&mut self, secret: Option<String>) {
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.auth.token_secret = secret;
        }
    }

    /// Fill in a random token secret when none is configured
    ///
    /// Sessions then do not survive a restart.
    pub async fn ensure_secret(&mut self, random: &dyn RandomEffects) {
        if self.auth.token_secret.is_empty() {
            warn!("No token secret configured, using a random one; sessions end on restart");
            self.auth.token_secret = hex::encode(random.random_bytes_32().await);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            return Err(HaError::invalid("server.bind must not be empty"));
        }
        self.auth.validate()?;
        let mut codes = std::collections::BTreeSet::new();
        for house in &self.bootstrap.houses {
            if !codes.insert(house.code.trim().to_ascii_lowercase()) {
                return Err(HaError::invalid(format!(
                    "bootstrap house code {} is listed twice",
                    house.code
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_full_file() {
        let config = ServerConfig::from_toml(&format!(
            r#"
            [server]
            bind = "0.0.0.0:9000"

            [auth]
            token_secret = "{SECRET}"
            access_token_ttl_secs = 60

            [logging]
            filter = "debug"

            [[bootstrap.houses]]
            name = "Casa Lima"
            code = "casa-lima"
            pin = "4826"
            admin_name = "Ana"
            "#
        ))
        .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.session_sweep_secs, 300);
        assert_eq!(config.auth.access_token_ttl_secs, 60);
        assert_eq!(config.auth.refresh_token_ttl_secs, 7 * 24 * 60 * 60);
        assert_eq!(config.logging.filter.as_deref(), Some("debug"));
        assert_eq!(config.bootstrap.houses[0].code, "casa-lima");
        assert!(config.validate().is_ok());
        assert!(!format!("{:?}", config.bootstrap.houses[0]).contains("4826"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ServerConfig::load(Path::new("/nonexistent/homeasisstan.toml")).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_validation() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_err());

        config.apply_secret_override(Some(SECRET.to_string()));
        assert!(config.validate().is_ok());
        config.apply_secret_override(Some(String::new()));
        assert_eq!(config.auth.token_secret, SECRET);

        let house = BootstrapHouse {
            name: "A".into(),
            code: "casa".into(),
            pin: "4826".into(),
            admin_name: "Ana".into(),
        };
        config.bootstrap.houses = vec![
            house.clone(),
            BootstrapHouse {
                code: "CASA".into(),
                ..house
            },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_toml() {
        assert!(ServerConfig::from_toml("[server\nbind=").is_err());
    }
}
