//! Uniform signing contract over the available wallet backends
//!
//! Callers connect and sign through [`WalletConnector`] without knowing
//! whether the hardware vault or an external wallet app does the work.
//! Missing platform handles and backend failures come back as
//! [`WalletResult::Failure`], never as errors or panics.

pub mod mwa;
pub mod seed_vault;

pub use mwa::{MobileWalletAdapterClient, MwaAuthorization, MwaOutcome, MwaWalletConnector};
pub use seed_vault::SeedVaultWalletConnector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::VaultResult;
use crate::shared::types::WalletBackend;

/// Outcome of a connector operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletResult<T> {
    Success(T),
    Failure(String),
}

impl<T> WalletResult<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        WalletResult::Failure(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WalletResult::Success(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            WalletResult::Success(value) => Some(value),
            WalletResult::Failure(_) => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            WalletResult::Success(_) => None,
            WalletResult::Failure(message) => Some(message),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> WalletResult<U> {
        match self {
            WalletResult::Success(value) => WalletResult::Success(f(value)),
            WalletResult::Failure(message) => WalletResult::Failure(message),
        }
    }
}

impl<T> From<VaultResult<T>> for WalletResult<T> {
    fn from(result: VaultResult<T>) -> Self {
        match result {
            Ok(value) => WalletResult::Success(value),
            Err(e) => WalletResult::Failure(e.message().to_string()),
        }
    }
}

/// A wallet account made available by a connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConnection {
    pub public_key: Vec<u8>,
    pub address: String,
    pub label: String,
    pub backend: WalletBackend,
}

pub type ConnectionResult = WalletResult<WalletConnection>;

/// Opaque handle to the host activity that can show Seed Vault prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityHandle(Uuid);

impl ActivityHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for ActivityHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque handle the host uses to route wallet-app results back to MWA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityResultSender(Uuid);

impl ActivityResultSender {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for ActivityResultSender {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectParams {
    pub activity: Option<ActivityHandle>,
    pub result_sender: Option<ActivityResultSender>,
}

impl ConnectParams {
    pub fn with_activity(activity: ActivityHandle) -> Self {
        Self {
            activity: Some(activity),
            result_sender: None,
        }
    }

    pub fn with_result_sender(result_sender: ActivityResultSender) -> Self {
        Self {
            activity: None,
            result_sender: Some(result_sender),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignMessageParams {
    pub message: Vec<u8>,
    pub activity: Option<ActivityHandle>,
    pub result_sender: Option<ActivityResultSender>,
}

impl SignMessageParams {
    pub fn new(message: impl Into<Vec<u8>>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn activity(mut self, activity: ActivityHandle) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn result_sender(mut self, result_sender: ActivityResultSender) -> Self {
        self.result_sender = Some(result_sender);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignTransactionParams {
    pub transaction: Vec<u8>,
    pub activity: Option<ActivityHandle>,
    pub result_sender: Option<ActivityResultSender>,
}

impl SignTransactionParams {
    pub fn new(transaction: impl Into<Vec<u8>>) -> Self {
        Self {
            transaction: transaction.into(),
            ..Default::default()
        }
    }

    pub fn activity(mut self, activity: ActivityHandle) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn result_sender(mut self, result_sender: ActivityResultSender) -> Self {
        self.result_sender = Some(result_sender);
        self
    }
}

/// Connect and sign through one signing backend
#[async_trait]
pub trait WalletConnector: Send + Sync {
    fn backend(&self) -> WalletBackend;

    async fn connect(&self, params: ConnectParams) -> ConnectionResult;

    /// Returns the signature produced by the backend
    async fn sign_message(&self, params: SignMessageParams) -> WalletResult<Vec<u8>>;

    /// Returns the signed transaction
    async fn sign_transaction(&self, params: SignTransactionParams) -> WalletResult<Vec<u8>>;

    /// Forget the current connection
    fn disconnect(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::VaultError;

    #[test]
    fn test_wallet_result_helpers() {
        let ok: WalletResult<u8> = WalletResult::Success(7);
        assert!(ok.is_success());
        assert_eq!(ok.failure_message(), None);
        assert_eq!(ok.clone().map(|v| v * 2), WalletResult::Success(14));
        assert_eq!(ok.ok(), Some(7));

        let failed: WalletResult<u8> = WalletResult::failure("nope");
        assert!(!failed.is_success());
        assert_eq!(failed.failure_message(), Some("nope"));
        assert_eq!(failed.ok(), None);
    }

    #[test]
    fn test_wallet_result_from_vault_result() {
        let failed: WalletResult<()> = Err(VaultError::busy("already running")).into();
        assert_eq!(failed, WalletResult::Failure("already running".to_string()));

        let ok: WalletResult<u32> = Ok(3).into();
        assert_eq!(ok, WalletResult::Success(3));
    }

    #[test]
    fn test_handles_are_unique() {
        assert_ne!(ActivityHandle::new(), ActivityHandle::new());
        assert_ne!(ActivityResultSender::new().id(), ActivityResultSender::new().id());
    }

    #[test]
    fn test_params_builders() {
        let activity = ActivityHandle::new();
        let params = SignMessageParams::new(b"gm".to_vec()).activity(activity);
        assert_eq!(params.activity, Some(activity));
        assert_eq!(params.result_sender, None);
        assert_eq!(params.message, b"gm".to_vec());

        let sender = ActivityResultSender::new();
        let connect = ConnectParams::with_result_sender(sender);
        assert_eq!(connect.result_sender, Some(sender));
        assert!(connect.activity.is_none());
    }
}
