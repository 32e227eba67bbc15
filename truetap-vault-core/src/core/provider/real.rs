//! Seed Vault provider backed by the platform bridge
//!
//! Each operation registers a pending completion keyed by its request code,
//! launches the request, and suspends until `handle_activity_result` delivers
//! the outcome. Only one request per code may be outstanding; a second one is
//! rejected rather than replacing the first. There is no timeout: dropping the
//! returned future is the only way to abandon a request, and its slot is then
//! reclaimed by the next request on the same code.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

use super::{SeedVaultProvider, EMPTY_MESSAGE, EMPTY_TRANSACTION, NOT_AUTHORIZED};
use crate::core::derivation::DerivationPath;
use crate::infrastructure::platform::{PlatformBridge, PlatformRequest};
use crate::shared::constants::*;
use crate::shared::error::{VaultError, VaultResult};
use crate::shared::types::{
    AuthResult, ProviderInfo, PublicKeyResult, RequestCode, ResultCode, ResultExtras, SigningResult,
};
use crate::shared::utils::{base58_encode, u64_from_be_bytes};

/// Logical request channels, one per Seed Vault action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum VaultChannel {
    Authorize,
    PublicKey,
    SignTransaction,
    SignMessage,
}

impl VaultChannel {
    fn request_code(&self) -> RequestCode {
        match self {
            VaultChannel::Authorize => REQUEST_AUTHORIZE,
            VaultChannel::PublicKey => REQUEST_GET_PUBLIC_KEY,
            VaultChannel::SignTransaction => REQUEST_SIGN_TRANSACTION,
            VaultChannel::SignMessage => REQUEST_SIGN_MESSAGE,
        }
    }

    fn action(&self) -> &'static str {
        match self {
            VaultChannel::Authorize => ACTION_AUTHORIZE_SEED_ACCESS,
            VaultChannel::PublicKey => ACTION_GET_PUBLIC_KEY,
            VaultChannel::SignTransaction => ACTION_SIGN_TRANSACTION,
            VaultChannel::SignMessage => ACTION_SIGN_MESSAGE,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            VaultChannel::Authorize => "authorization",
            VaultChannel::PublicKey => "public key",
            VaultChannel::SignTransaction => "transaction signing",
            VaultChannel::SignMessage => "message signing",
        }
    }
}

/// Completion delivered by the platform
#[derive(Debug)]
struct ActivityResult {
    result_code: ResultCode,
    extras: ResultExtras,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Authorization {
    token: Option<u64>,
}

pub struct RealSeedVaultProvider {
    bridge: Arc<dyn PlatformBridge>,
    pending: Mutex<HashMap<RequestCode, oneshot::Sender<ActivityResult>>>,
    authorization: Mutex<Option<Authorization>>,
    info: ProviderInfo,
}

impl RealSeedVaultProvider {
    pub fn new(bridge: Arc<dyn PlatformBridge>) -> Self {
        Self {
            bridge,
            pending: Mutex::new(HashMap::new()),
            authorization: Mutex::new(None),
            info: ProviderInfo {
                name: REAL_PROVIDER_NAME.to_string(),
                version: PROVIDER_VERSION.to_string(),
                is_fake: false,
                description: "Hardware-backed key custody on Solana Mobile devices".to_string(),
            },
        }
    }

    /// Number of requests waiting for a platform result
    pub fn pending_requests(&self) -> usize {
        self.pending
            .lock()
            .map(|pending| pending.values().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    pub fn is_authorized(&self) -> bool {
        self.authorization().map(|a| a.is_some()).unwrap_or(false)
    }

    fn pending(&self) -> VaultResult<MutexGuard<'_, HashMap<RequestCode, oneshot::Sender<ActivityResult>>>> {
        self.pending
            .lock()
            .map_err(|_| VaultError::internal("Pending request table is poisoned"))
    }

    fn authorization(&self) -> VaultResult<MutexGuard<'_, Option<Authorization>>> {
        self.authorization
            .lock()
            .map_err(|_| VaultError::internal("Authorization state is poisoned"))
    }

    fn current_token(&self) -> VaultResult<Option<u64>> {
        match *self.authorization()? {
            Some(auth) => Ok(auth.token),
            None => Err(VaultError::validation(NOT_AUTHORIZED)),
        }
    }

    /// Launch a request on `channel` and wait for its completion
    async fn dispatch(
        &self,
        channel: VaultChannel,
        payload: Option<Vec<u8>>,
        derivation_path: Option<DerivationPath>,
        auth_token: Option<u64>,
    ) -> VaultResult<ActivityResult> {
        if !self.bridge.resolves(channel.action()).await {
            return Err(VaultError::not_available(format!(
                "No handler for Seed Vault {} on this device",
                channel.label()
            )));
        }

        let code = channel.request_code();
        let receiver = {
            let mut pending = self.pending()?;
            if let Some(existing) = pending.get(&code) {
                if !existing.is_closed() {
                    return Err(VaultError::busy(format!(
                        "A Seed Vault {} request is already in progress",
                        channel.label()
                    )));
                }
                log::debug!("Reclaiming abandoned {} request slot", channel.label());
            }
            let (sender, receiver) = oneshot::channel();
            pending.insert(code, sender);
            receiver
        };

        let request = PlatformRequest {
            request_code: code,
            action: channel.action().to_string(),
            payload,
            derivation_path,
            auth_token,
        };
        log::debug!("Launching Seed Vault {} request ({})", channel.label(), code);
        if let Err(e) = self.bridge.launch(request).await {
            self.pending()?.remove(&code);
            log::warn!("Failed to launch Seed Vault {} request: {}", channel.label(), e);
            return Err(e);
        }

        receiver.await.map_err(|_| {
            VaultError::internal(format!("Seed Vault {} request was abandoned", channel.label()))
        })
    }

    async fn sign(&self, channel: VaultChannel, payload: &[u8], derivation_path: &DerivationPath) -> SigningResult {
        let token = match self.current_token() {
            Ok(token) => token,
            Err(e) => return SigningResult::Error(e.message().to_string()),
        };

        let result = match self
            .dispatch(channel, Some(payload.to_vec()), Some(*derivation_path), token)
            .await
        {
            Ok(result) => result,
            Err(e) => return SigningResult::Error(e.message().to_string()),
        };

        match result.result_code {
            ResultCode::Ok => {
                let signature = match result.extras.get(EXTRA_SIGNATURE) {
                    Some(signature) if signature.len() == SIGNATURE_SIZE => signature.clone(),
                    Some(signature) => {
                        return SigningResult::Error(format!(
                            "Seed Vault returned a {}-byte signature",
                            signature.len()
                        ))
                    }
                    None => return SigningResult::Error("Seed Vault returned no signature".to_string()),
                };
                let signed_transaction = match channel {
                    VaultChannel::SignTransaction => result.extras.get(EXTRA_SIGNED_TRANSACTION).cloned(),
                    _ => None,
                };
                log::info!("Seed Vault {} completed ({})", channel.label(), derivation_path);
                SigningResult::Success {
                    signature,
                    signed_transaction,
                }
            }
            ResultCode::Canceled => {
                log::info!("User declined Seed Vault {}", channel.label());
                SigningResult::UserDenied
            }
            ResultCode::Other(code) => SigningResult::Error(format!(
                "Seed Vault {} failed with result code {}",
                channel.label(),
                code
            )),
        }
    }
}

#[async_trait]
impl SeedVaultProvider for RealSeedVaultProvider {
    async fn is_available(&self) -> bool {
        let resolved = join_all(REQUIRED_ACTIONS.iter().map(|action| self.bridge.resolves(action))).await;
        let mut available = true;
        for (action, resolves) in REQUIRED_ACTIONS.iter().zip(resolved) {
            if !resolves {
                log::debug!("Seed Vault action not resolvable: {}", action);
                available = false;
            }
        }
        available
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }

    async fn request_authorization(&self) -> AuthResult {
        let result = match self.dispatch(VaultChannel::Authorize, None, None, None).await {
            Ok(result) => result,
            Err(VaultError::NotAvailable(message)) => {
                log::warn!("{}", message);
                return AuthResult::NotAvailable;
            }
            Err(e) => return AuthResult::Error(e.message().to_string()),
        };

        match result.result_code {
            ResultCode::Ok => {
                let token = match result.extras.get(EXTRA_AUTH_TOKEN) {
                    Some(bytes) => match u64_from_be_bytes(bytes) {
                        Ok(token) => Some(token),
                        Err(e) => return AuthResult::Error(format!("Invalid authorization token: {}", e.message())),
                    },
                    None => None,
                };
                match self.authorization() {
                    Ok(mut auth) => *auth = Some(Authorization { token }),
                    Err(e) => return AuthResult::Error(e.message().to_string()),
                }
                log::info!("Seed Vault access authorized");
                AuthResult::Success
            }
            ResultCode::Canceled => {
                log::info!("User declined Seed Vault authorization");
                AuthResult::UserDenied
            }
            ResultCode::Other(code) => {
                AuthResult::Error(format!("Seed Vault authorization failed with result code {}", code))
            }
        }
    }

    async fn get_public_key(&self, derivation_path: &DerivationPath) -> PublicKeyResult {
        let token = match self.current_token() {
            Ok(token) => token,
            Err(e) => return PublicKeyResult::Error(e.message().to_string()),
        };

        let result = match self
            .dispatch(VaultChannel::PublicKey, None, Some(*derivation_path), token)
            .await
        {
            Ok(result) => result,
            Err(e) => return PublicKeyResult::Error(e.message().to_string()),
        };

        match result.result_code {
            ResultCode::Ok => match result.extras.get(EXTRA_PUBLIC_KEY) {
                Some(key) if key.len() == PUBLIC_KEY_SIZE => {
                    log::info!("Fetched public key {} for {}", base58_encode(key), derivation_path);
                    PublicKeyResult::success(key.clone())
                }
                Some(key) => PublicKeyResult::Error(format!("Seed Vault returned a {}-byte public key", key.len())),
                None => PublicKeyResult::Error("Seed Vault returned no public key".to_string()),
            },
            ResultCode::Canceled => {
                log::info!("User declined Seed Vault public key request");
                PublicKeyResult::UserDenied
            }
            ResultCode::Other(code) => {
                PublicKeyResult::Error(format!("Seed Vault public key request failed with result code {}", code))
            }
        }
    }

    async fn sign_transaction(&self, transaction: &[u8], derivation_path: &DerivationPath) -> SigningResult {
        if transaction.is_empty() {
            return SigningResult::Error(EMPTY_TRANSACTION.to_string());
        }
        self.sign(VaultChannel::SignTransaction, transaction, derivation_path).await
    }

    async fn sign_message(&self, message: &[u8], derivation_path: &DerivationPath) -> SigningResult {
        if message.is_empty() {
            return SigningResult::Error(EMPTY_MESSAGE.to_string());
        }
        self.sign(VaultChannel::SignMessage, message, derivation_path).await
    }

    fn handle_activity_result(&self, request_code: RequestCode, result_code: ResultCode, extras: ResultExtras) -> bool {
        let sender = match self.pending() {
            Ok(mut pending) => pending.remove(&request_code),
            Err(e) => {
                log::error!("{}", e);
                return false;
            }
        };

        match sender {
            Some(sender) => {
                let delivered = sender.send(ActivityResult { result_code, extras }).is_ok();
                if !delivered {
                    log::warn!("Caller for request {} is gone; result dropped", request_code);
                }
                delivered
            }
            None => {
                log::warn!("Activity result for request {} has no pending request", request_code);
                false
            }
        }
    }

    fn deauthorize(&self) {
        if let Ok(mut auth) = self.authorization() {
            *auth = None;
        }
        if let Ok(mut pending) = self.pending() {
            // Dropping the senders wakes any waiters with an abandoned error
            pending.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::platform::{BridgeHost, ChannelBridge};
    use std::time::Duration;

    fn provider_with_actions(actions: &[&str]) -> (Arc<RealSeedVaultProvider>, BridgeHost) {
        let (bridge, host) = ChannelBridge::new(actions.iter().copied());
        (Arc::new(RealSeedVaultProvider::new(Arc::new(bridge))), host)
    }

    fn full_provider() -> (Arc<RealSeedVaultProvider>, BridgeHost) {
        provider_with_actions(&REQUIRED_ACTIONS)
    }

    fn extras(pairs: &[(&str, Vec<u8>)]) -> ResultExtras {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    /// Answer the next launched request with the given result
    async fn answer_next(
        provider: &RealSeedVaultProvider,
        host: &mut BridgeHost,
        result_code: ResultCode,
        extras: ResultExtras,
    ) -> PlatformRequest {
        let request = host.next_request().await.expect("request launched");
        assert!(provider.handle_activity_result(request.request_code, result_code, extras));
        request
    }

    async fn authorize(provider: &Arc<RealSeedVaultProvider>, host: &mut BridgeHost) {
        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.request_authorization().await }
        });
        answer_next(provider, host, ResultCode::Ok, extras(&[(EXTRA_AUTH_TOKEN, 42u64.to_be_bytes().to_vec())])).await;
        assert_eq!(task.await.expect("join"), AuthResult::Success);
    }

    #[tokio::test]
    async fn test_availability_requires_all_actions() {
        let (provider, _host) = full_provider();
        assert!(provider.is_available().await);

        let (partial, _host) = provider_with_actions(&[ACTION_AUTHORIZE_SEED_ACCESS]);
        assert!(!partial.is_available().await);
        assert!(!partial.provider_info().is_fake);
    }

    #[test]
    fn test_request_suspends_until_result_arrives() {
        let (provider, mut host) = full_provider();
        let mut task = tokio_test::task::spawn(provider.request_authorization());
        tokio_test::assert_pending!(task.poll());

        let request = host.try_next_request().expect("request launched");
        assert_eq!(request.request_code, REQUEST_AUTHORIZE);
        assert!(provider.handle_activity_result(REQUEST_AUTHORIZE, ResultCode::Ok, ResultExtras::new()));

        assert!(task.is_woken());
        tokio_test::assert_ready_eq!(task.poll(), AuthResult::Success);
        assert!(provider.is_authorized());
    }

    #[tokio::test]
    async fn test_authorization_not_available_fails_fast() {
        let (provider, mut host) = provider_with_actions(&[]);
        assert_eq!(provider.request_authorization().await, AuthResult::NotAvailable);
        assert!(host.try_next_request().is_none());
    }

    #[tokio::test]
    async fn test_authorization_outcomes() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;
        assert!(provider.is_authorized());

        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.request_authorization().await }
        });
        answer_next(&provider, &mut host, ResultCode::Canceled, ResultExtras::new()).await;
        assert_eq!(task.await.expect("join"), AuthResult::UserDenied);

        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.request_authorization().await }
        });
        answer_next(&provider, &mut host, ResultCode::Other(5), ResultExtras::new()).await;
        assert!(matches!(task.await.expect("join"), AuthResult::Error(m) if m.contains("5")));
    }

    #[tokio::test]
    async fn test_public_key_requires_authorization() {
        let (provider, mut host) = full_provider();
        let result = provider.get_public_key(&DerivationPath::default()).await;
        assert_eq!(result, PublicKeyResult::Error(NOT_AUTHORIZED.to_string()));
        assert!(host.try_next_request().is_none());
    }

    #[tokio::test]
    async fn test_public_key_round_trip() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;

        let path = DerivationPath::for_account(3).expect("path");
        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.get_public_key(&path).await }
        });
        let key = vec![0x01; PUBLIC_KEY_SIZE];
        let request = answer_next(&provider, &mut host, ResultCode::Ok, extras(&[(EXTRA_PUBLIC_KEY, key.clone())])).await;

        assert_eq!(request.request_code, REQUEST_GET_PUBLIC_KEY);
        assert_eq!(request.derivation_path, Some(path));
        assert_eq!(request.auth_token, Some(42));
        assert_eq!(task.await.expect("join"), PublicKeyResult::success(key));
    }

    #[tokio::test]
    async fn test_public_key_rejects_malformed_extras() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;

        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.get_public_key(&DerivationPath::default()).await }
        });
        answer_next(&provider, &mut host, ResultCode::Ok, extras(&[(EXTRA_PUBLIC_KEY, vec![1, 2, 3])])).await;
        assert!(matches!(task.await.expect("join"), PublicKeyResult::Error(_)));
    }

    #[tokio::test]
    async fn test_empty_transaction_rejected_before_launch() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;

        let result = provider.sign_transaction(&[], &DerivationPath::default()).await;
        assert_eq!(result, SigningResult::Error(EMPTY_TRANSACTION.to_string()));
        let result = provider.sign_message(&[], &DerivationPath::default()).await;
        assert_eq!(result, SigningResult::Error(EMPTY_MESSAGE.to_string()));
        assert!(host.try_next_request().is_none());
    }

    #[tokio::test]
    async fn test_sign_transaction_success() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;

        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.sign_transaction(&[1, 2, 3], &DerivationPath::default()).await }
        });
        let request = answer_next(
            &provider,
            &mut host,
            ResultCode::Ok,
            extras(&[
                (EXTRA_SIGNATURE, vec![9; SIGNATURE_SIZE]),
                (EXTRA_SIGNED_TRANSACTION, vec![4, 5, 6]),
            ]),
        )
        .await;

        assert_eq!(request.payload, Some(vec![1, 2, 3]));
        assert_eq!(
            task.await.expect("join"),
            SigningResult::Success {
                signature: vec![9; SIGNATURE_SIZE],
                signed_transaction: Some(vec![4, 5, 6]),
            }
        );
    }

    #[tokio::test]
    async fn test_sign_message_denied_and_bad_signature() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;

        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.sign_message(b"hello", &DerivationPath::default()).await }
        });
        answer_next(&provider, &mut host, ResultCode::Canceled, ResultExtras::new()).await;
        assert_eq!(task.await.expect("join"), SigningResult::UserDenied);

        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.sign_message(b"hello", &DerivationPath::default()).await }
        });
        answer_next(&provider, &mut host, ResultCode::Ok, extras(&[(EXTRA_SIGNATURE, vec![1; 10])])).await;
        assert!(matches!(task.await.expect("join"), SigningResult::Error(_)));
    }

    #[tokio::test]
    async fn test_overlapping_request_is_rejected() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;

        let first = tokio::spawn({
            let provider = provider.clone();
            async move { provider.sign_message(b"first", &DerivationPath::default()).await }
        });
        let request = host.next_request().await.expect("first launched");
        assert_eq!(provider.pending_requests(), 1);

        let second = provider.sign_message(b"second", &DerivationPath::default()).await;
        assert!(matches!(second, SigningResult::Error(m) if m.contains("already in progress")));

        assert!(provider.handle_activity_result(
            request.request_code,
            ResultCode::Ok,
            extras(&[(EXTRA_SIGNATURE, vec![1; SIGNATURE_SIZE])]),
        ));
        assert!(matches!(first.await.expect("join"), SigningResult::Success { .. }));
        assert_eq!(provider.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_channels_receive_their_own_results() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;

        let message = tokio::spawn({
            let provider = provider.clone();
            async move { provider.sign_message(b"message", &DerivationPath::default()).await }
        });
        let transaction = tokio::spawn({
            let provider = provider.clone();
            async move { provider.sign_transaction(&[7, 7, 7], &DerivationPath::default()).await }
        });

        let mut launched = vec![
            host.next_request().await.expect("first launched"),
            host.next_request().await.expect("second launched"),
        ];
        launched.sort_by_key(|r| r.request_code);
        let codes: Vec<_> = launched.iter().map(|r| r.request_code).collect();
        assert_eq!(codes, vec![REQUEST_SIGN_TRANSACTION, REQUEST_SIGN_MESSAGE]);
        assert_eq!(provider.pending_requests(), 2);

        // Answer in the opposite order to the launches
        assert!(provider.handle_activity_result(
            REQUEST_SIGN_TRANSACTION,
            ResultCode::Ok,
            extras(&[(EXTRA_SIGNATURE, vec![1; SIGNATURE_SIZE])]),
        ));
        assert!(provider.handle_activity_result(
            REQUEST_SIGN_MESSAGE,
            ResultCode::Ok,
            extras(&[(EXTRA_SIGNATURE, vec![2; SIGNATURE_SIZE])]),
        ));

        assert_eq!(
            transaction.await.expect("join"),
            SigningResult::Success {
                signature: vec![1; SIGNATURE_SIZE],
                signed_transaction: None,
            }
        );
        assert_eq!(
            message.await.expect("join"),
            SigningResult::Success {
                signature: vec![2; SIGNATURE_SIZE],
                signed_transaction: None,
            }
        );
        assert_eq!(provider.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_request_slot_is_reclaimed() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            provider.sign_message(b"first", &DerivationPath::default()),
        )
        .await;
        assert!(abandoned.is_err());
        host.next_request().await.expect("first launched");

        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.sign_message(b"second", &DerivationPath::default()).await }
        });
        let request = answer_next(&provider, &mut host, ResultCode::Ok, extras(&[(EXTRA_SIGNATURE, vec![2; SIGNATURE_SIZE])])).await;
        assert_eq!(request.payload, Some(b"second".to_vec()));
        assert!(matches!(task.await.expect("join"), SigningResult::Success { .. }));
    }

    #[tokio::test]
    async fn test_unmatched_result_is_ignored() {
        let (provider, _host) = full_provider();
        assert!(!provider.handle_activity_result(REQUEST_SIGN_MESSAGE, ResultCode::Ok, ResultExtras::new()));
        assert!(!provider.handle_activity_result(4242, ResultCode::Ok, ResultExtras::new()));
    }

    #[tokio::test]
    async fn test_launch_failure_becomes_error() {
        let (provider, host) = full_provider();
        drop(host);
        let result = provider.request_authorization().await;
        assert!(matches!(result, AuthResult::Error(m) if m.contains("not listening")));
        assert_eq!(provider.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_deauthorize_releases_waiters() {
        let (provider, mut host) = full_provider();
        authorize(&provider, &mut host).await;

        let task = tokio::spawn({
            let provider = provider.clone();
            async move { provider.sign_message(b"pending", &DerivationPath::default()).await }
        });
        host.next_request().await.expect("launched");
        provider.deauthorize();

        assert!(matches!(task.await.expect("join"), SigningResult::Error(m) if m.contains("abandoned")));
        assert!(!provider.is_authorized());
    }
}
