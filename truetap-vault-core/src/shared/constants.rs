//! Constants for the vault core
//!
//! This module contains all constants used throughout the vault core.

// Key and signature sizes (ed25519)
pub const PUBLIC_KEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 64;
pub const SEED_SIZE: usize = 32;
pub const DERIVATION_PATH_SIZE: usize = 16;

// BIP-44 path components
pub const HARDENED_BIT: u32 = 0x8000_0000;
pub const BIP44_PURPOSE: u32 = 44;
pub const SOLANA_COIN_TYPE: u32 = 501;
pub const DEFAULT_ACCOUNT_INDEX: u32 = 0;
pub const DEFAULT_CHANGE: u32 = 0;

// Seed Vault package and actions
pub const SEED_VAULT_PACKAGE: &str = "com.solanamobile.seedvault";
pub const SEED_VAULT_SERVICE: &str = "com.solanamobile.seedvault.SeedVaultContentProvider";
pub const ACTION_AUTHORIZE_SEED_ACCESS: &str = "com.solanamobile.seedvault.wallet.v1.ACTION_AUTHORIZE_SEED_ACCESS";
pub const ACTION_GET_PUBLIC_KEY: &str = "com.solanamobile.seedvault.wallet.v1.ACTION_GET_PUBLIC_KEY";
pub const ACTION_SIGN_TRANSACTION: &str = "com.solanamobile.seedvault.wallet.v1.ACTION_SIGN_TRANSACTION";
pub const ACTION_SIGN_MESSAGE: &str = "com.solanamobile.seedvault.wallet.v1.ACTION_SIGN_MESSAGE";

pub const REQUIRED_ACTIONS: [&str; 4] = [
    ACTION_AUTHORIZE_SEED_ACCESS,
    ACTION_GET_PUBLIC_KEY,
    ACTION_SIGN_TRANSACTION,
    ACTION_SIGN_MESSAGE,
];

// Request codes
pub const REQUEST_AUTHORIZE: i32 = 1001;
pub const REQUEST_GET_PUBLIC_KEY: i32 = 1002;
pub const REQUEST_SIGN_TRANSACTION: i32 = 1003;
pub const REQUEST_SIGN_MESSAGE: i32 = 1004;

// Activity result codes
pub const RESULT_OK: i32 = -1;
pub const RESULT_CANCELED: i32 = 0;

// Result extras
pub const EXTRA_PUBLIC_KEY: &str = "public_key";
pub const EXTRA_SIGNATURE: &str = "signature";
pub const EXTRA_SIGNED_TRANSACTION: &str = "signed_transaction";
pub const EXTRA_AUTH_TOKEN: &str = "auth_token";

// Device detection
pub const SEEKER_MODELS: [&str; 1] = ["Seeker"];
pub const SOLANA_MOBILE_MANUFACTURERS: [&str; 2] = ["Solana Mobile", "Solana Mobile Inc."];
pub const MIN_SEED_VAULT_PLATFORM_VERSION: u32 = 31;

// Provider identity
pub const REAL_PROVIDER_NAME: &str = "Seed Vault";
pub const FAKE_PROVIDER_NAME: &str = "Simulated Seed Vault";
pub const PROVIDER_VERSION: &str = "v1";

/// A wallet application that can serve Mobile Wallet Adapter requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletAppConfig {
    pub package: &'static str,
    pub label: &'static str,
}

pub static PHANTOM_WALLET: WalletAppConfig = WalletAppConfig {
    package: "app.phantom",
    label: "Phantom",
};

pub static SOLFLARE_WALLET: WalletAppConfig = WalletAppConfig {
    package: "com.solflare.mobile",
    label: "Solflare",
};

pub static BACKPACK_WALLET: WalletAppConfig = WalletAppConfig {
    package: "app.backpack.mobile",
    label: "Backpack",
};

pub static FALLBACK_WALLETS: [WalletAppConfig; 3] = [PHANTOM_WALLET, SOLFLARE_WALLET, BACKPACK_WALLET];

// MWA defaults
pub const DEFAULT_APP_NAME: &str = "TrueTap";
pub const DEFAULT_APP_URI: &str = "https://truetap.app";
pub const DEFAULT_APP_ICON: &str = "favicon.ico";
