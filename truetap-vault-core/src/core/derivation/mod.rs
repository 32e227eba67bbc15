//! BIP-44 derivation paths in the Seed Vault wire format
//!
//! A path is carried as 16 raw bytes: four big-endian u32 index groups for
//! purpose, coin type, account and change. Purpose, coin and account are
//! hardened; change is the unhardened constant 0.

use std::fmt;

use crate::shared::constants::*;
use crate::shared::error::VaultError;

/// A Solana BIP-44 derivation path, `m/44'/501'/{account}'/0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    bytes: [u8; DERIVATION_PATH_SIZE],
}

impl DerivationPath {
    /// Build the path for an account index. The hardened bit must be free.
    pub fn for_account(account_index: u32) -> Result<Self, VaultError> {
        if account_index & HARDENED_BIT != 0 {
            return Err(VaultError::validation(format!(
                "Account index {} exceeds the hardened range",
                account_index
            )));
        }

        let groups = [
            HARDENED_BIT | BIP44_PURPOSE,
            HARDENED_BIT | SOLANA_COIN_TYPE,
            HARDENED_BIT | account_index,
            DEFAULT_CHANGE,
        ];
        let mut bytes = [0u8; DERIVATION_PATH_SIZE];
        for (chunk, group) in bytes.chunks_exact_mut(4).zip(groups) {
            chunk.copy_from_slice(&group.to_be_bytes());
        }
        Ok(Self { bytes })
    }

    /// The path used when no account is specified
    pub fn default_account() -> Self {
        Self {
            bytes: DEFAULT_PATH_BYTES,
        }
    }

    /// Parse and validate a raw 16-byte path
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VaultError> {
        if bytes.is_empty() {
            return Err(VaultError::validation("Derivation path is empty"));
        }
        let bytes: [u8; DERIVATION_PATH_SIZE] = bytes.try_into().map_err(|_| {
            VaultError::validation(format!(
                "Derivation path must be {} bytes, got {}",
                DERIVATION_PATH_SIZE,
                bytes.len()
            ))
        })?;

        let path = Self { bytes };
        if path.group(0) != HARDENED_BIT | BIP44_PURPOSE {
            return Err(VaultError::validation("Unsupported derivation purpose"));
        }
        if path.group(1) != HARDENED_BIT | SOLANA_COIN_TYPE {
            return Err(VaultError::validation("Unsupported coin type"));
        }
        if path.group(2) & HARDENED_BIT == 0 {
            return Err(VaultError::validation("Account index must be hardened"));
        }
        if path.group(3) != DEFAULT_CHANGE {
            return Err(VaultError::validation("Unsupported change index"));
        }
        Ok(path)
    }

    /// Account index without the hardened bit
    pub fn account_index(&self) -> u32 {
        self.group(2) & !HARDENED_BIT
    }

    pub fn as_bytes(&self) -> &[u8; DERIVATION_PATH_SIZE] {
        &self.bytes
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    fn group(&self, index: usize) -> u32 {
        let start = index * 4;
        u32::from_be_bytes([
            self.bytes[start],
            self.bytes[start + 1],
            self.bytes[start + 2],
            self.bytes[start + 3],
        ])
    }
}

const DEFAULT_PATH_BYTES: [u8; DERIVATION_PATH_SIZE] = [
    0x80, 0x00, 0x00, 0x2C, 0x80, 0x00, 0x01, 0xF5, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

impl Default for DerivationPath {
    fn default() -> Self {
        Self::default_account()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}",
            self.group(0) & !HARDENED_BIT,
            self.group(1) & !HARDENED_BIT,
            self.account_index(),
            self.group(3)
        )
    }
}

impl TryFrom<&[u8]> for DerivationPath {
    type Error = VaultError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}
