//! Error handling for the vault core
//!
//! This module defines the error type used inside the vault core. Provider and
//! connector boundaries never surface it directly: they convert it into their
//! tagged result variants.

use thiserror::Error;

/// Vault error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not available: {0}")]
    NotAvailable(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Request already in progress: {0}")]
    Busy(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-available error
    pub fn not_available(message: impl Into<String>) -> Self {
        Self::NotAvailable(message.into())
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }

    /// Create a busy error
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy(message.into())
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Message without the category prefix, as shown to users
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m)
            | Self::Validation(m)
            | Self::NotAvailable(m)
            | Self::Platform(m)
            | Self::Busy(m)
            | Self::Encoding(m)
            | Self::Internal(m) => m,
        }
    }
}

/// Result alias used by fallible internal code
pub type VaultResult<T> = Result<T, VaultError>;

// Standard library error conversions
impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::platform(format!("IO error: {}", err))
    }
}

impl From<hex::FromHexError> for VaultError {
    fn from(err: hex::FromHexError) -> Self {
        Self::encoding(format!("Hex decoding error: {}", err))
    }
}

impl From<bs58::decode::Error> for VaultError {
    fn from(err: bs58::decode::Error) -> Self {
        Self::encoding(format!("Base58 decoding error: {}", err))
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::encoding(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_error_creation() {
        let config_error = VaultError::config("Invalid configuration");
        let busy_error = VaultError::busy("authorize");
        let validation_error = VaultError::validation("Invalid input");

        assert!(matches!(config_error, VaultError::Config(_)));
        assert!(matches!(busy_error, VaultError::Busy(_)));
        assert!(matches!(validation_error, VaultError::Validation(_)));
    }

    #[test]
    fn test_error_conversions() {
        let hex_error = hex::decode("zz").unwrap_err();
        let vault_error: VaultError = hex_error.into();
        assert!(matches!(vault_error, VaultError::Encoding(_)));

        let bs58_error = bs58::decode("0OIl").into_vec().unwrap_err();
        let vault_error: VaultError = bs58_error.into();
        assert!(matches!(vault_error, VaultError::Encoding(_)));
    }

    #[test]
    fn test_error_display() {
        let error = VaultError::not_available("Seed Vault is not installed");
        let display = format!("{}", error);

        assert!(display.contains("Not available"));
        assert!(display.contains("Seed Vault is not installed"));
        assert_eq!(error.message(), "Seed Vault is not installed");
    }
}
