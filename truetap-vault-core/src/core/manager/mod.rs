//! Seed Vault session orchestration
//!
//! [`SeedVaultManager`] drives a provider through
//! `Idle -> Authorizing -> Authorized -> FetchingKey -> Ready`, with `Error`
//! reachable from any phase, and publishes its state through a
//! `tokio::sync::watch` channel. Only one error is visible at a time; each new
//! failure overwrites the previous one.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::core::derivation::DerivationPath;
use crate::core::provider::SeedVaultProvider;
use crate::shared::constants::DEFAULT_ACCOUNT_INDEX;
use crate::shared::types::{
    AuthResult, ProviderInfo, PublicKeyResult, RequestCode, ResultCode, ResultExtras, SessionPhase,
    SignedTransaction, SigningResult, VaultPublicKey, VaultState,
};
use crate::shared::utils::abbreviate;

pub const ERROR_NOT_AVAILABLE: &str = "Seed Vault is not available on this device";
pub const ERROR_AUTH_DENIED: &str = "Seed Vault authorization was denied";
pub const ERROR_KEY_DENIED: &str = "Public key request was denied";
pub const ERROR_TRANSACTION_DENIED: &str = "Transaction signing was denied";
pub const ERROR_MESSAGE_DENIED: &str = "Message signing was denied";

/// Phase implied by the state once nothing is in flight
fn settled_phase(state: &VaultState) -> SessionPhase {
    if state.public_key.is_some() {
        SessionPhase::Ready
    } else if state.is_authorized {
        SessionPhase::Authorized
    } else {
        SessionPhase::Idle
    }
}

/// Tracks one operation in flight. The last one to finish, or to be
/// cancelled, clears the loading flag and settles any transient phase.
struct LoadingGuard<'a> {
    manager: &'a SeedVaultManager,
}

impl<'a> LoadingGuard<'a> {
    fn start(manager: &'a SeedVaultManager) -> Self {
        let mut operations = manager.operations();
        *operations += 1;
        manager.state.send_modify(|s| s.is_loading = true);
        Self { manager }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut operations = self.manager.operations();
        *operations = operations.saturating_sub(1);
        if *operations == 0 {
            self.manager.state.send_modify(|s| {
                s.is_loading = false;
                if matches!(s.phase, SessionPhase::Authorizing | SessionPhase::FetchingKey) {
                    s.phase = settled_phase(s);
                }
            });
        }
    }
}

pub struct SeedVaultManager {
    provider: Arc<dyn SeedVaultProvider>,
    state: watch::Sender<VaultState>,
    operations: Mutex<usize>,
}

impl SeedVaultManager {
    pub fn new(provider: Arc<dyn SeedVaultProvider>) -> Self {
        let (state, _) = watch::channel(VaultState::default());
        Self {
            provider,
            state,
            operations: Mutex::new(0),
        }
    }

    fn operations(&self) -> MutexGuard<'_, usize> {
        self.operations.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state snapshot
    pub fn state(&self) -> VaultState {
        self.state.borrow().clone()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<VaultState> {
        self.state.subscribe()
    }

    pub fn provider_info(&self) -> ProviderInfo {
        self.provider.provider_info()
    }

    pub fn public_key(&self) -> Option<VaultPublicKey> {
        self.state.borrow().public_key.clone()
    }

    pub fn is_authorized(&self) -> bool {
        self.state.borrow().is_authorized
    }

    /// Authorize with the provider and, on success, fetch the key for the
    /// default account
    pub async fn initialize_and_authorize(&self) -> Option<VaultPublicKey> {
        let _loading = LoadingGuard::start(self);
        log::info!("Initializing {}", self.provider.provider_info().name);

        if !self.provider.is_available().await {
            self.fail(ERROR_NOT_AVAILABLE.to_string());
            return None;
        }

        self.state.send_modify(|s| s.phase = SessionPhase::Authorizing);
        match self.provider.request_authorization().await {
            AuthResult::Success => {
                self.state.send_modify(|s| {
                    s.is_authorized = true;
                    s.phase = SessionPhase::Authorized;
                });
                self.get_public_key(DEFAULT_ACCOUNT_INDEX).await
            }
            AuthResult::UserDenied => {
                self.fail(ERROR_AUTH_DENIED.to_string());
                None
            }
            AuthResult::NotAvailable => {
                self.fail(ERROR_NOT_AVAILABLE.to_string());
                None
            }
            AuthResult::Error(message) => {
                self.fail(format!("Seed Vault authorization failed: {}", message));
                None
            }
        }
    }

    /// Fetch the public key for `account_index` and publish it
    pub async fn get_public_key(&self, account_index: u32) -> Option<VaultPublicKey> {
        let path = match DerivationPath::for_account(account_index) {
            Ok(path) => path,
            Err(e) => {
                self.fail(e.message().to_string());
                return None;
            }
        };

        let _loading = LoadingGuard::start(self);
        self.state.send_modify(|s| s.phase = SessionPhase::FetchingKey);

        match self.provider.get_public_key(&path).await {
            PublicKeyResult::Success { public_key, base58 } => {
                log::info!("Public key ready: {}", abbreviate(&base58));
                let key = VaultPublicKey {
                    bytes: public_key,
                    base58,
                };
                self.state.send_modify(|s| {
                    s.public_key = Some(key.clone());
                    s.phase = SessionPhase::Ready;
                });
                Some(key)
            }
            PublicKeyResult::UserDenied => {
                self.fail(ERROR_KEY_DENIED.to_string());
                None
            }
            PublicKeyResult::Error(message) => {
                self.fail(format!("Failed to get public key: {}", message));
                None
            }
        }
    }

    /// Sign a transaction with the default account. Returns the raw signature.
    pub async fn sign_transaction(&self, transaction: &[u8]) -> Option<Vec<u8>> {
        self.sign_transaction_detailed(transaction)
            .await
            .map(|signed| signed.signature)
    }

    /// Sign a transaction with the default account, keeping the signed
    /// transaction when the provider returns one
    pub async fn sign_transaction_detailed(&self, transaction: &[u8]) -> Option<SignedTransaction> {
        let path = DerivationPath::default_account();
        match self.provider.sign_transaction(transaction, &path).await {
            SigningResult::Success {
                signature,
                signed_transaction,
            } => Some(SignedTransaction {
                signature,
                signed_transaction,
            }),
            SigningResult::UserDenied => {
                self.set_error(ERROR_TRANSACTION_DENIED.to_string());
                None
            }
            SigningResult::Error(message) => {
                self.set_error(format!("Transaction signing failed: {}", message));
                None
            }
        }
    }

    /// Sign a message with the default account. Returns the raw signature.
    pub async fn sign_message(&self, message: &[u8]) -> Option<Vec<u8>> {
        let path = DerivationPath::default_account();
        match self.provider.sign_message(message, &path).await {
            SigningResult::Success { signature, .. } => Some(signature),
            SigningResult::UserDenied => {
                self.set_error(ERROR_MESSAGE_DENIED.to_string());
                None
            }
            SigningResult::Error(message) => {
                self.set_error(format!("Message signing failed: {}", message));
                None
            }
        }
    }

    pub fn handle_activity_result(&self, request_code: RequestCode, result_code: ResultCode, extras: ResultExtras) -> bool {
        self.provider.handle_activity_result(request_code, result_code, extras)
    }

    /// Reset the error slot. Leaves keys and authorization untouched.
    pub fn clear_error(&self) {
        self.state.send_modify(|s| {
            s.error = None;
            if s.phase == SessionPhase::Error {
                s.phase = settled_phase(s);
            }
        });
    }

    /// Drop authorization and return to `Idle`
    pub fn disconnect(&self) {
        self.provider.deauthorize();
        let operations = self.operations();
        self.state.send_replace(VaultState {
            is_loading: *operations > 0,
            ..VaultState::default()
        });
        log::info!("Seed Vault session disconnected");
    }

    fn set_error(&self, message: String) {
        log::warn!("{}", message);
        self.state.send_modify(|s| s.error = Some(message));
    }

    fn fail(&self, message: String) {
        log::warn!("{}", message);
        self.state.send_modify(|s| {
            s.error = Some(message);
            s.phase = SessionPhase::Error;
        });
    }
}
