//! Connector over the Seed Vault session manager

use async_trait::async_trait;
use std::sync::Arc;

use super::{
    ConnectParams, ConnectionResult, SignMessageParams, SignTransactionParams, WalletConnection, WalletConnector,
    WalletResult,
};
use crate::core::manager::SeedVaultManager;
use crate::core::transactions::attach_fee_payer_signature;
use crate::shared::types::{VaultPublicKey, WalletBackend};

pub const MISSING_ACTIVITY_CONNECT: &str = "Missing Activity for Seed Vault connect";
pub const MISSING_ACTIVITY_SIGN_MESSAGE: &str = "Missing Activity for Seed Vault message signing";
pub const MISSING_ACTIVITY_SIGN_TRANSACTION: &str = "Missing Activity for Seed Vault transaction signing";

const SEED_VAULT_LABEL: &str = "Seed Vault";

pub struct SeedVaultWalletConnector {
    manager: Arc<SeedVaultManager>,
}

impl SeedVaultWalletConnector {
    pub fn new(manager: Arc<SeedVaultManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<SeedVaultManager> {
        &self.manager
    }

    /// Last error published by the manager, or `fallback`
    fn failure<T>(&self, fallback: &str) -> WalletResult<T> {
        let message = self.manager.state().error.unwrap_or_else(|| fallback.to_string());
        WalletResult::Failure(message)
    }

    fn connection(key: VaultPublicKey) -> WalletConnection {
        WalletConnection {
            public_key: key.bytes,
            address: key.base58,
            label: SEED_VAULT_LABEL.to_string(),
            backend: WalletBackend::SeedVault,
        }
    }
}

#[async_trait]
impl WalletConnector for SeedVaultWalletConnector {
    fn backend(&self) -> WalletBackend {
        WalletBackend::SeedVault
    }

    async fn connect(&self, params: ConnectParams) -> ConnectionResult {
        if params.activity.is_none() {
            return WalletResult::failure(MISSING_ACTIVITY_CONNECT);
        }

        if let Some(key) = self.manager.public_key() {
            log::debug!("Reusing Seed Vault connection {}", key);
            return WalletResult::Success(Self::connection(key));
        }

        match self.manager.initialize_and_authorize().await {
            Some(key) => WalletResult::Success(Self::connection(key)),
            None => self.failure("Seed Vault connect failed"),
        }
    }

    async fn sign_message(&self, params: SignMessageParams) -> WalletResult<Vec<u8>> {
        if params.activity.is_none() {
            return WalletResult::failure(MISSING_ACTIVITY_SIGN_MESSAGE);
        }

        match self.manager.sign_message(&params.message).await {
            Some(signature) => WalletResult::Success(signature),
            None => self.failure("Message signing failed"),
        }
    }

    async fn sign_transaction(&self, params: SignTransactionParams) -> WalletResult<Vec<u8>> {
        if params.activity.is_none() {
            return WalletResult::failure(MISSING_ACTIVITY_SIGN_TRANSACTION);
        }

        let signed = match self.manager.sign_transaction_detailed(&params.transaction).await {
            Some(signed) => signed,
            None => return self.failure("Transaction signing failed"),
        };

        match signed.signed_transaction {
            Some(transaction) => WalletResult::Success(transaction),
            None => attach_fee_payer_signature(&params.transaction, &signed.signature).into(),
        }
    }

    fn disconnect(&self) {
        self.manager.disconnect();
    }
}
