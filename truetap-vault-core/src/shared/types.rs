use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::constants::{RESULT_CANCELED, RESULT_OK};
use crate::shared::utils::base58_encode;

// Basic types for custody operations
pub type Signature = Vec<u8>;
pub type RequestCode = i32;
pub type ResultExtras = std::collections::HashMap<String, Vec<u8>>;

/// Static identity of a key-custody provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub version: String,
    pub is_fake: bool,
    pub description: String,
}

/// Outcome of an authorization request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Success,
    Error(String),
    UserDenied,
    NotAvailable,
}

/// Outcome of a public-key fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PublicKeyResult {
    Success { public_key: Vec<u8>, base58: String },
    Error(String),
    UserDenied,
}

impl PublicKeyResult {
    /// Build a success result, rendering the Base58 form from the raw bytes
    pub fn success(public_key: Vec<u8>) -> Self {
        let base58 = base58_encode(&public_key);
        Self::Success { public_key, base58 }
    }
}

/// Outcome of a transaction or message signing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningResult {
    Success {
        signature: Signature,
        signed_transaction: Option<Vec<u8>>,
    },
    Error(String),
    UserDenied,
}

/// A public key held by the session, with its user-facing rendering
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultPublicKey {
    pub bytes: Vec<u8>,
    pub base58: String,
}

impl fmt::Display for VaultPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base58)
    }
}

/// Signature plus the fully signed transaction, when one was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub signature: Signature,
    pub signed_transaction: Option<Vec<u8>>,
}

/// Point-in-time snapshot of device capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceValidationResult {
    pub is_genuine_seeker: bool,
    pub has_seed_vault: bool,
    pub seed_vault_version: Option<String>,
    pub device_info: String,
    pub validation_errors: Vec<String>,
}

/// Phase of the custody session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Idle,
    Authorizing,
    Authorized,
    FetchingKey,
    Ready,
    Error,
}

/// Observable state of a custody session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    pub phase: SessionPhase,
    pub public_key: Option<VaultPublicKey>,
    pub is_authorized: bool,
    pub error: Option<String>,
    pub is_loading: bool,
}

/// Result code delivered with an activity result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    Canceled,
    Other(i32),
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        match code {
            RESULT_OK => ResultCode::Ok,
            RESULT_CANCELED => ResultCode::Canceled,
            other => ResultCode::Other(other),
        }
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        match code {
            ResultCode::Ok => RESULT_OK,
            ResultCode::Canceled => RESULT_CANCELED,
            ResultCode::Other(other) => other,
        }
    }
}

/// Signing backend a connector talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletBackend {
    SeedVault,
    MobileWalletAdapter,
}

impl WalletBackend {
    pub fn name(&self) -> &'static str {
        match self {
            WalletBackend::SeedVault => "Seed Vault",
            WalletBackend::MobileWalletAdapter => "Mobile Wallet Adapter",
        }
    }
}

// Cluster types - Solana clusters reachable through MWA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cluster {
    #[default]
    #[serde(rename = "mainnet-beta")]
    MainnetBeta,
    #[serde(rename = "devnet")]
    Devnet,
    #[serde(rename = "testnet")]
    Testnet,
}

impl Cluster {
    pub fn name(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet-beta" | "mainnet" => Some(Cluster::MainnetBeta),
            "devnet" => Some(Cluster::Devnet),
            "testnet" => Some(Cluster::Testnet),
            _ => None,
        }
    }
}

/// Identity presented to external wallets during MWA authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub name: String,
    pub uri: String,
    pub icon_uri: String,
}
