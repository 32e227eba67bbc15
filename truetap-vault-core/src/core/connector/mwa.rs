//! Connector that signs through an external wallet app over Mobile Wallet
//! Adapter

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{
    ActivityResultSender, ConnectParams, ConnectionResult, SignMessageParams, SignTransactionParams, WalletConnection,
    WalletConnector, WalletResult,
};
use crate::shared::types::{AppIdentity, Cluster, WalletBackend};
use crate::shared::utils::{abbreviate, base58_encode};

pub const MISSING_SENDER_CONNECT: &str = "Missing ActivityResultSender for MWA connect";
pub const MISSING_SENDER_SIGN_MESSAGE: &str = "Missing ActivityResultSender for MWA message signing";
pub const MISSING_SENDER_SIGN_TRANSACTION: &str = "Missing ActivityResultSender for MWA transaction signing";
pub const NOT_CONNECTED: &str = "Wallet is not connected";
pub const NO_WALLET_FOUND: &str = "No Mobile Wallet Adapter compatible wallet is installed";

const DEFAULT_MWA_LABEL: &str = "Mobile Wallet Adapter";

/// Outcome of a Mobile Wallet Adapter round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MwaOutcome<T> {
    Success(T),
    NoWalletFound,
    Failure(String),
}

/// Account granted by the wallet app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MwaAuthorization {
    pub auth_token: String,
    pub public_key: Vec<u8>,
    pub account_label: Option<String>,
}

/// Client side of the Mobile Wallet Adapter protocol
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MobileWalletAdapterClient: Send + Sync {
    /// Authorize, or reauthorize when `auth_token` is present
    async fn authorize(
        &self,
        sender: ActivityResultSender,
        identity: AppIdentity,
        cluster: Cluster,
        auth_token: Option<String>,
    ) -> MwaOutcome<MwaAuthorization>;

    /// Returns one signature per message
    async fn sign_messages(
        &self,
        sender: ActivityResultSender,
        auth_token: String,
        messages: Vec<Vec<u8>>,
        addresses: Vec<Vec<u8>>,
    ) -> MwaOutcome<Vec<Vec<u8>>>;

    /// Returns one signed transaction per input
    async fn sign_transactions(
        &self,
        sender: ActivityResultSender,
        auth_token: String,
        transactions: Vec<Vec<u8>>,
    ) -> MwaOutcome<Vec<Vec<u8>>>;
}

#[derive(Debug, Clone)]
struct MwaSession {
    auth_token: String,
    public_key: Vec<u8>,
}

pub struct MwaWalletConnector {
    client: Arc<dyn MobileWalletAdapterClient>,
    identity: AppIdentity,
    cluster: Cluster,
    session: Mutex<Option<MwaSession>>,
}

impl MwaWalletConnector {
    pub fn new(client: Arc<dyn MobileWalletAdapterClient>, identity: AppIdentity, cluster: Cluster) -> Self {
        Self {
            client,
            identity,
            cluster,
            session: Mutex::new(None),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session().is_some()
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    fn session(&self) -> Option<MwaSession> {
        self.session.lock().ok().and_then(|session| session.clone())
    }

    fn store_session(&self, session: Option<MwaSession>) {
        if let Ok(mut current) = self.session.lock() {
            *current = session;
        }
    }

    fn first<T>(outcome: MwaOutcome<Vec<T>>, what: &str) -> WalletResult<T> {
        match outcome {
            MwaOutcome::Success(items) => match items.into_iter().next() {
                Some(item) => WalletResult::Success(item),
                None => WalletResult::Failure(format!("Wallet returned no {}", what)),
            },
            MwaOutcome::NoWalletFound => WalletResult::failure(NO_WALLET_FOUND),
            MwaOutcome::Failure(message) => WalletResult::Failure(format!("MWA {} failed: {}", what, message)),
        }
    }
}

#[async_trait]
impl WalletConnector for MwaWalletConnector {
    fn backend(&self) -> WalletBackend {
        WalletBackend::MobileWalletAdapter
    }

    async fn connect(&self, params: ConnectParams) -> ConnectionResult {
        let sender = match params.result_sender {
            Some(sender) => sender,
            None => return WalletResult::failure(MISSING_SENDER_CONNECT),
        };

        let cached_token = self.session().map(|session| session.auth_token);
        let outcome = self
            .client
            .authorize(sender, self.identity.clone(), self.cluster, cached_token)
            .await;

        match outcome {
            MwaOutcome::Success(authorization) => {
                let address = base58_encode(&authorization.public_key);
                log::info!("MWA wallet connected on {}: {}", self.cluster.name(), abbreviate(&address));
                self.store_session(Some(MwaSession {
                    auth_token: authorization.auth_token,
                    public_key: authorization.public_key.clone(),
                }));
                WalletResult::Success(WalletConnection {
                    public_key: authorization.public_key,
                    address,
                    label: authorization
                        .account_label
                        .unwrap_or_else(|| DEFAULT_MWA_LABEL.to_string()),
                    backend: WalletBackend::MobileWalletAdapter,
                })
            }
            MwaOutcome::NoWalletFound => {
                log::warn!("{}", NO_WALLET_FOUND);
                WalletResult::failure(NO_WALLET_FOUND)
            }
            MwaOutcome::Failure(message) => {
                self.store_session(None);
                WalletResult::Failure(format!("MWA connect failed: {}", message))
            }
        }
    }

    async fn sign_message(&self, params: SignMessageParams) -> WalletResult<Vec<u8>> {
        let sender = match params.result_sender {
            Some(sender) => sender,
            None => return WalletResult::failure(MISSING_SENDER_SIGN_MESSAGE),
        };
        let session = match self.session() {
            Some(session) => session,
            None => return WalletResult::failure(NOT_CONNECTED),
        };
        if params.message.is_empty() {
            return WalletResult::failure("Message bytes must not be empty");
        }

        let outcome = self
            .client
            .sign_messages(sender, session.auth_token, vec![params.message], vec![session.public_key])
            .await;
        Self::first(outcome, "message signature")
    }

    async fn sign_transaction(&self, params: SignTransactionParams) -> WalletResult<Vec<u8>> {
        let sender = match params.result_sender {
            Some(sender) => sender,
            None => return WalletResult::failure(MISSING_SENDER_SIGN_TRANSACTION),
        };
        let session = match self.session() {
            Some(session) => session,
            None => return WalletResult::failure(NOT_CONNECTED),
        };
        if params.transaction.is_empty() {
            return WalletResult::failure("Transaction bytes must not be empty");
        }

        let outcome = self
            .client
            .sign_transactions(sender, session.auth_token, vec![params.transaction])
            .await;
        Self::first(outcome, "signed transaction")
    }

    fn disconnect(&self) {
        self.store_session(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    fn identity() -> AppIdentity {
        AppIdentity {
            name: "TrueTap".to_string(),
            uri: "https://truetap.app".to_string(),
            icon_uri: "favicon.ico".to_string(),
        }
    }

    fn authorization() -> MwaAuthorization {
        MwaAuthorization {
            auth_token: "token-1".to_string(),
            public_key: vec![0x01, 0x02, 0x03, 0x04],
            account_label: Some("Phantom".to_string()),
        }
    }

    fn connector(client: MockMobileWalletAdapterClient) -> MwaWalletConnector {
        MwaWalletConnector::new(Arc::new(client), identity(), Cluster::Devnet)
    }

    #[tokio::test]
    async fn test_connect_without_sender_fails() {
        let mut client = MockMobileWalletAdapterClient::new();
        client.expect_authorize().never();
        let connector = connector(client);

        let result = connector.connect(ConnectParams::default()).await;
        assert_eq!(result, WalletResult::Failure(MISSING_SENDER_CONNECT.to_string()));
    }

    #[tokio::test]
    async fn test_connect_caches_authorization() {
        let mut client = MockMobileWalletAdapterClient::new();
        client
            .expect_authorize()
            .with(always(), eq(identity()), eq(Cluster::Devnet), eq(None::<String>))
            .times(1)
            .returning(|_, _, _, _| MwaOutcome::Success(authorization()));
        client
            .expect_authorize()
            .with(always(), always(), always(), eq(Some("token-1".to_string())))
            .times(1)
            .returning(|_, _, _, _| MwaOutcome::Success(authorization()));
        let connector = connector(client);
        let sender = ActivityResultSender::new();

        let connection = connector
            .connect(ConnectParams::with_result_sender(sender))
            .await
            .ok()
            .expect("connected");
        assert_eq!(connection.address, "2VfUX");
        assert_eq!(connection.label, "Phantom");
        assert_eq!(connection.backend, WalletBackend::MobileWalletAdapter);
        assert!(connector.is_connected());

        // second connect reauthorizes with the cached token
        assert!(connector.connect(ConnectParams::with_result_sender(sender)).await.is_success());
    }

    #[tokio::test]
    async fn test_no_wallet_found() {
        let mut client = MockMobileWalletAdapterClient::new();
        client
            .expect_authorize()
            .returning(|_, _, _, _| MwaOutcome::NoWalletFound);
        let connector = connector(client);

        let result = connector
            .connect(ConnectParams::with_result_sender(ActivityResultSender::new()))
            .await;
        assert_eq!(result.failure_message(), Some(NO_WALLET_FOUND));
        assert!(!connector.is_connected());
    }

    #[tokio::test]
    async fn test_signing_requires_connection() {
        let mut client = MockMobileWalletAdapterClient::new();
        client.expect_sign_messages().never();
        client.expect_sign_transactions().never();
        let connector = connector(client);
        let sender = ActivityResultSender::new();

        let message = connector
            .sign_message(SignMessageParams::new(b"gm".to_vec()).result_sender(sender))
            .await;
        assert_eq!(message.failure_message(), Some(NOT_CONNECTED));

        let transaction = connector
            .sign_transaction(SignTransactionParams::new(vec![1u8; 8]))
            .await;
        assert_eq!(transaction.failure_message(), Some(MISSING_SENDER_SIGN_TRANSACTION));
    }

    #[tokio::test]
    async fn test_sign_with_cached_session() {
        let mut client = MockMobileWalletAdapterClient::new();
        client
            .expect_authorize()
            .returning(|_, _, _, _| MwaOutcome::Success(authorization()));
        client
            .expect_sign_messages()
            .with(
                always(),
                eq("token-1".to_string()),
                eq(vec![b"gm".to_vec()]),
                eq(vec![vec![0x01, 0x02, 0x03, 0x04]]),
            )
            .times(1)
            .returning(|_, _, _, _| MwaOutcome::Success(vec![vec![0xAA; 64]]));
        client
            .expect_sign_transactions()
            .times(1)
            .returning(|_, _, transactions| MwaOutcome::Success(transactions));
        let connector = connector(client);
        let sender = ActivityResultSender::new();
        connector.connect(ConnectParams::with_result_sender(sender)).await;

        let signature = connector
            .sign_message(SignMessageParams::new(b"gm".to_vec()).result_sender(sender))
            .await;
        assert_eq!(signature, WalletResult::Success(vec![0xAA; 64]));

        let transaction = connector
            .sign_transaction(SignTransactionParams::new(vec![5u8; 10]).result_sender(sender))
            .await;
        assert_eq!(transaction, WalletResult::Success(vec![5u8; 10]));
    }

    #[tokio::test]
    async fn test_wallet_failures_become_failures() {
        let mut client = MockMobileWalletAdapterClient::new();
        client
            .expect_authorize()
            .returning(|_, _, _, _| MwaOutcome::Success(authorization()));
        client
            .expect_sign_transactions()
            .returning(|_, _, _| MwaOutcome::Failure("declined".to_string()));
        client
            .expect_sign_messages()
            .returning(|_, _, _, _| MwaOutcome::Success(Vec::new()));
        let connector = connector(client);
        let sender = ActivityResultSender::new();
        connector.connect(ConnectParams::with_result_sender(sender)).await;

        let transaction = connector
            .sign_transaction(SignTransactionParams::new(vec![5u8; 10]).result_sender(sender))
            .await;
        assert_eq!(
            transaction.failure_message(),
            Some("MWA signed transaction failed: declined")
        );

        let message = connector
            .sign_message(SignMessageParams::new(b"gm".to_vec()).result_sender(sender))
            .await;
        assert_eq!(message.failure_message(), Some("Wallet returned no message signature"));

        connector.disconnect();
        assert!(!connector.is_connected());
    }
}
