//! Simulated Seed Vault for devices without custody hardware
//!
//! Keys are ed25519 and derived from a 32-byte seed plus the derivation path,
//! so every account has its own stable key. The approval behavior is
//! scriptable, which lets callers exercise denial and failure paths without a
//! device.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha512};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use zeroize::{Zeroize, Zeroizing};

use super::{SeedVaultProvider, EMPTY_MESSAGE, EMPTY_TRANSACTION, NOT_AUTHORIZED};
use crate::core::derivation::DerivationPath;
use crate::core::transactions::WireTransaction;
use crate::shared::constants::*;
use crate::shared::types::{
    AuthResult, ProviderInfo, PublicKeyResult, RequestCode, ResultCode, ResultExtras, SigningResult,
};

const KEY_DERIVATION_DOMAIN: &[u8] = b"truetap-simulated-seed-vault";

/// How the simulated user responds to prompts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FakeBehavior {
    #[default]
    Approve,
    Deny,
    Fail(String),
    Unavailable,
}

pub struct FakeSeedVaultProvider {
    seed: Zeroizing<[u8; SEED_SIZE]>,
    behavior: Mutex<FakeBehavior>,
    authorized: AtomicBool,
    info: ProviderInfo,
}

impl FakeSeedVaultProvider {
    /// Create a provider from a fixed seed, or a random one when `None`
    pub fn new(seed: Option<[u8; SEED_SIZE]>) -> Self {
        let seed = match seed {
            Some(seed) => Zeroizing::new(seed),
            None => {
                let mut seed = Zeroizing::new([0u8; SEED_SIZE]);
                OsRng.fill_bytes(&mut *seed);
                seed
            }
        };
        Self {
            seed,
            behavior: Mutex::new(FakeBehavior::Approve),
            authorized: AtomicBool::new(false),
            info: ProviderInfo {
                name: FAKE_PROVIDER_NAME.to_string(),
                version: PROVIDER_VERSION.to_string(),
                is_fake: true,
                description: "Software ed25519 keys for development and non-Seeker devices".to_string(),
            },
        }
    }

    pub fn with_behavior(self, behavior: FakeBehavior) -> Self {
        self.set_behavior(behavior);
        self
    }

    pub fn set_behavior(&self, behavior: FakeBehavior) {
        if let Ok(mut current) = self.behavior.lock() {
            *current = behavior;
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    /// Public key for `derivation_path`, without any prompt
    pub fn public_key_for(&self, derivation_path: &DerivationPath) -> [u8; PUBLIC_KEY_SIZE] {
        self.signing_key(derivation_path).verifying_key().to_bytes()
    }

    fn behavior(&self) -> FakeBehavior {
        self.behavior
            .lock()
            .map(|b| b.clone())
            .unwrap_or_else(|_| FakeBehavior::Fail("Simulated vault state is poisoned".to_string()))
    }

    fn signing_key(&self, derivation_path: &DerivationPath) -> SigningKey {
        let mut hasher = Sha512::new();
        hasher.update(KEY_DERIVATION_DOMAIN);
        hasher.update(&*self.seed);
        hasher.update(derivation_path.as_bytes());
        let mut digest = hasher.finalize();

        let mut secret = Zeroizing::new([0u8; SEED_SIZE]);
        secret.copy_from_slice(&digest[..SEED_SIZE]);
        digest.as_mut_slice().zeroize();
        SigningKey::from_bytes(&secret)
    }

    /// Resolve the simulated prompt. `None` means approved.
    fn prompt<T>(&self, denied: T, failed: impl FnOnce(String) -> T) -> Option<T> {
        match self.behavior() {
            FakeBehavior::Approve => None,
            FakeBehavior::Deny => Some(denied),
            FakeBehavior::Fail(message) => Some(failed(message)),
            FakeBehavior::Unavailable => Some(failed("Simulated Seed Vault is not available".to_string())),
        }
    }
}

impl Default for FakeSeedVaultProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl SeedVaultProvider for FakeSeedVaultProvider {
    async fn is_available(&self) -> bool {
        self.behavior() != FakeBehavior::Unavailable
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }

    async fn request_authorization(&self) -> AuthResult {
        match self.behavior() {
            FakeBehavior::Approve => {
                self.authorized.store(true, Ordering::SeqCst);
                log::info!("Simulated Seed Vault access authorized");
                AuthResult::Success
            }
            FakeBehavior::Deny => AuthResult::UserDenied,
            FakeBehavior::Fail(message) => AuthResult::Error(message),
            FakeBehavior::Unavailable => AuthResult::NotAvailable,
        }
    }

    async fn get_public_key(&self, derivation_path: &DerivationPath) -> PublicKeyResult {
        if !self.is_authorized() {
            return PublicKeyResult::Error(NOT_AUTHORIZED.to_string());
        }
        if let Some(outcome) = self.prompt(PublicKeyResult::UserDenied, PublicKeyResult::Error) {
            return outcome;
        }
        PublicKeyResult::success(self.public_key_for(derivation_path).to_vec())
    }

    async fn sign_transaction(&self, transaction: &[u8], derivation_path: &DerivationPath) -> SigningResult {
        if transaction.is_empty() {
            return SigningResult::Error(EMPTY_TRANSACTION.to_string());
        }
        if !self.is_authorized() {
            return SigningResult::Error(NOT_AUTHORIZED.to_string());
        }
        if let Some(outcome) = self.prompt(SigningResult::UserDenied, SigningResult::Error) {
            return outcome;
        }

        let key = self.signing_key(derivation_path);
        match WireTransaction::parse(transaction) {
            Ok(wire) if wire.signature_count() > 0 => {
                let signature = key.sign(wire.message()).to_bytes();
                match wire.with_signature(0, &signature) {
                    Ok(signed) => SigningResult::Success {
                        signature: signature.to_vec(),
                        signed_transaction: Some(signed),
                    },
                    Err(e) => SigningResult::Error(e.message().to_string()),
                }
            }
            Ok(_) => {
                log::debug!("Wire transaction has no signature slots; signing raw bytes");
                SigningResult::Success {
                    signature: key.sign(transaction).to_bytes().to_vec(),
                    signed_transaction: None,
                }
            }
            Err(e) => {
                log::debug!("Not a wire transaction ({}); signing raw bytes", e);
                SigningResult::Success {
                    signature: key.sign(transaction).to_bytes().to_vec(),
                    signed_transaction: None,
                }
            }
        }
    }

    async fn sign_message(&self, message: &[u8], derivation_path: &DerivationPath) -> SigningResult {
        if message.is_empty() {
            return SigningResult::Error(EMPTY_MESSAGE.to_string());
        }
        if !self.is_authorized() {
            return SigningResult::Error(NOT_AUTHORIZED.to_string());
        }
        if let Some(outcome) = self.prompt(SigningResult::UserDenied, SigningResult::Error) {
            return outcome;
        }

        SigningResult::Success {
            signature: self.signing_key(derivation_path).sign(message).to_bytes().to_vec(),
            signed_transaction: None,
        }
    }

    fn handle_activity_result(&self, request_code: RequestCode, _result_code: ResultCode, _extras: ResultExtras) -> bool {
        log::debug!("Simulated Seed Vault ignores activity result {}", request_code);
        false
    }

    fn deauthorize(&self) {
        self.authorized.store(false, Ordering::SeqCst);
    }
}
