//! Runtime configuration for the vault core
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file) and fall back to safe defaults.

use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

use crate::shared::constants::*;
use crate::shared::error::VaultError;
use crate::shared::types::{AppIdentity, Cluster};
use crate::shared::utils::hex_to_bytes;

pub const ENV_CLUSTER: &str = "TRUETAP_CLUSTER";
pub const ENV_APP_NAME: &str = "TRUETAP_APP_NAME";
pub const ENV_APP_URI: &str = "TRUETAP_APP_URI";
pub const ENV_APP_ICON: &str = "TRUETAP_APP_ICON";
pub const ENV_FORCE_FAKE_VAULT: &str = "TRUETAP_FORCE_FAKE_VAULT";
pub const ENV_FAKE_SEED: &str = "TRUETAP_FAKE_SEED";
pub const ENV_FALLBACK_WALLETS: &str = "TRUETAP_FALLBACK_WALLETS";

/// Wallet application probed when the hardware vault is unavailable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackWallet {
    pub package: String,
    pub label: String,
}

impl From<&WalletAppConfig> for FallbackWallet {
    fn from(config: &WalletAppConfig) -> Self {
        Self {
            package: config.package.to_string(),
            label: config.label.to_string(),
        }
    }
}

/// Vault core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    pub cluster: Cluster,
    pub identity: AppIdentity,
    pub force_fake_vault: bool,
    #[serde(skip_serializing)]
    pub fake_seed: Option<[u8; SEED_SIZE]>,
    pub fallback_wallets: Vec<FallbackWallet>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::MainnetBeta,
            identity: AppIdentity {
                name: DEFAULT_APP_NAME.to_string(),
                uri: DEFAULT_APP_URI.to_string(),
                icon_uri: DEFAULT_APP_ICON.to_string(),
            },
            force_fake_vault: false,
            fake_seed: None,
            fallback_wallets: FALLBACK_WALLETS.iter().map(FallbackWallet::from).collect(),
        }
    }
}

impl VaultConfig {
    /// Load configuration from `.env` (if present) and the environment
    pub fn from_env() -> Result<Self, VaultError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VaultError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_CLUSTER) {
            config.cluster = Cluster::parse(&value)
                .ok_or_else(|| VaultError::config(format!("Unknown cluster: {}", value)))?;
        }
        if let Some(name) = lookup(ENV_APP_NAME) {
            config.identity.name = name;
        }
        if let Some(uri) = lookup(ENV_APP_URI) {
            config.identity.uri = uri;
        }
        if let Some(icon) = lookup(ENV_APP_ICON) {
            config.identity.icon_uri = icon;
        }
        if let Some(value) = lookup(ENV_FORCE_FAKE_VAULT) {
            config.force_fake_vault = parse_flag(&value)?;
        }
        if let Some(value) = lookup(ENV_FAKE_SEED) {
            config.fake_seed = Some(parse_seed(&value)?);
        }
        if let Some(value) = lookup(ENV_FALLBACK_WALLETS) {
            config.fallback_wallets = parse_wallets(&value)?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Result<bool, VaultError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(VaultError::config(format!("Invalid boolean flag: {}", other))),
    }
}

fn parse_seed(value: &str) -> Result<[u8; SEED_SIZE], VaultError> {
    let bytes = hex_to_bytes(value.trim())
        .map_err(|e| VaultError::config(format!("Invalid fake seed: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| VaultError::config(format!("Fake seed must be {} bytes", SEED_SIZE)))
}

// Format: `package=Label,package2=Label2`; a bare package uses itself as label
fn parse_wallets(value: &str) -> Result<Vec<FallbackWallet>, VaultError> {
    let mut wallets = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (package, label) = match entry.split_once('=') {
            Some((package, label)) => (package.trim(), label.trim()),
            None => (entry, entry),
        };
        if package.is_empty() {
            return Err(VaultError::config(format!("Invalid fallback wallet entry: {}", entry)));
        }
        wallets.push(FallbackWallet {
            package: package.to_string(),
            label: label.to_string(),
        });
    }
    if wallets.is_empty() {
        return Err(VaultError::config("Fallback wallet list is empty"));
    }
    Ok(wallets)
}
