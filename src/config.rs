//! Configuration for the nonced transaction builder
//!
//! Loaded from a TOML file, with an environment override for the
//! subsidizer key.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::authority::{Authority, KeypairAuthority};
use crate::solana::PublicKey;
use crate::tx_builder::{NoncedTransactionBuilder, TransactionBuilderError};

/// Environment variable that overrides `subsidizer.public_key`.
pub const SUBSIDIZER_ENV: &str = "NONCED_TX_SUBSIDIZER";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub subsidizer: SubsidizerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the subsidizer identity comes from. Exactly one field must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubsidizerConfig {
    /// Base58 public key
    #[serde(default)]
    pub public_key: Option<PublicKey>,

    /// Solana CLI keypair file
    #[serde(default)]
    pub keypair_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl SubsidizerConfig {
    /// Resolve the subsidizer public key, loading the keypair file if needed.
    pub fn resolve(&self) -> anyhow::Result<PublicKey> {
        match (&self.public_key, &self.keypair_path) {
            (Some(key), None) => Ok(*key),
            (None, Some(path)) => {
                let authority = KeypairAuthority::from_file(path)
                    .with_context(|| format!("Failed to load subsidizer keypair: {}", path))?;
                Ok(authority.public_key())
            }
            (Some(_), Some(_)) => anyhow::bail!(TransactionBuilderError::Configuration(
                "set only one of subsidizer.public_key and subsidizer.keypair_path".to_string()
            )),
            (None, None) => anyhow::bail!(TransactionBuilderError::Configuration(
                "subsidizer.public_key or subsidizer.keypair_path is required".to_string()
            )),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, then apply `.env` and environment overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env_override(std::env::var(SUBSIDIZER_ENV).ok().as_deref())?;
        Ok(config)
    }

    /// Replace the subsidizer with a base58 key from the environment.
    pub fn apply_env_override(&mut self, value: Option<&str>) -> anyhow::Result<()> {
        if let Some(value) = value {
            let key: PublicKey = value
                .parse()
                .with_context(|| format!("Invalid {}", SUBSIDIZER_ENV))?;
            self.subsidizer = SubsidizerConfig {
                public_key: Some(key),
                keypair_path: None,
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match (&self.subsidizer.public_key, &self.subsidizer.keypair_path) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => anyhow::bail!(TransactionBuilderError::Configuration(
                "exactly one of subsidizer.public_key and subsidizer.keypair_path must be set"
                    .to_string()
            )),
        }
    }
}

impl NoncedTransactionBuilder {
    /// Build from configuration, resolving the subsidizer identity.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(config.subsidizer.resolve()?))
    }
}
