//! Key-custody providers
//!
//! A [`SeedVaultProvider`] is the capability contract for a custody backend:
//! availability, authorization, public-key retrieval and signing. Every
//! operation reports its outcome as a tagged result; failures never escape as
//! errors or panics.
//!
//! Two implementations exist:
//! - [`RealSeedVaultProvider`] issues requests through a
//!   [`PlatformBridge`](crate::infrastructure::platform::PlatformBridge) and
//!   resumes when the host delivers the matching activity result.
//! - [`FakeSeedVaultProvider`] signs in software for devices without a Seed
//!   Vault.

pub mod fake;
pub mod real;

pub use fake::{FakeBehavior, FakeSeedVaultProvider};
pub use real::RealSeedVaultProvider;

use async_trait::async_trait;

use crate::core::derivation::DerivationPath;
use crate::shared::types::{
    AuthResult, ProviderInfo, PublicKeyResult, RequestCode, ResultCode, ResultExtras, SigningResult,
};

/// Capability contract of a key-custody backend
#[async_trait]
pub trait SeedVaultProvider: Send + Sync {
    /// Whether the backend can serve requests. Never prompts the user.
    async fn is_available(&self) -> bool;

    fn provider_info(&self) -> ProviderInfo;

    /// Ask the user to grant access to the seed
    async fn request_authorization(&self) -> AuthResult;

    /// Fetch the public key at `derivation_path`. Requires authorization.
    async fn get_public_key(&self, derivation_path: &DerivationPath) -> PublicKeyResult;

    /// Sign a serialized transaction. `transaction` must be non-empty.
    async fn sign_transaction(&self, transaction: &[u8], derivation_path: &DerivationPath) -> SigningResult;

    /// Sign an arbitrary message. `message` must be non-empty.
    async fn sign_message(&self, message: &[u8], derivation_path: &DerivationPath) -> SigningResult;

    /// Deliver an asynchronous completion from the platform. Returns `true`
    /// when it matched an outstanding request.
    fn handle_activity_result(&self, request_code: RequestCode, result_code: ResultCode, extras: ResultExtras) -> bool;

    /// Drop any authorization held by the provider
    fn deauthorize(&self);
}

pub(crate) const NOT_AUTHORIZED: &str = "Seed Vault access has not been authorized";
pub(crate) const EMPTY_TRANSACTION: &str = "Transaction bytes must not be empty";
pub(crate) const EMPTY_MESSAGE: &str = "Message bytes must not be empty";
