//! Withdrawal attempts driven through the HTTP signer service.

use std::sync::{Arc, Mutex};

use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethscribe::blockchain::contract::bulkWithdrawItemsCall;
use ethscribe::blockchain::{BlockchainError, ConfirmationStatus, Wallet};
use ethscribe::config::WithdrawalConfig;
use ethscribe::withdrawal::{
    Clock, HttpSignerService, WithdrawalError, WithdrawalRequestBuilder, WithdrawalState,
    WithdrawalSubmitter,
};
use mockito::{Matcher, Server};
use serde_json::json;
use tokio_util::sync::CancellationToken;

mod common;

const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const ESCROW: &str = "0xc33f8610941be56fb0d84e25894c0d928cc97dde";
/// Expiry for a message signed at 2024-01-01T00:03:30Z.
const EXPIRY_SECS: &str = "1704068400";

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:03:30Z")
            .unwrap()
            .with_timezone(&Utc)
    }
}

#[derive(Default, Clone)]
struct RecordingSubmitter {
    calls: Arc<Mutex<Vec<bulkWithdrawItemsCall>>>,
}

#[async_trait]
impl WithdrawalSubmitter for RecordingSubmitter {
    async fn submit(&self, call: &bulkWithdrawItemsCall) -> Result<TxHash, BlockchainError> {
        self.calls.lock().unwrap().push(call.clone());
        Ok(TxHash::repeat_byte(0x5e))
    }

    async fn await_confirmation(
        &self,
        _tx_hash: TxHash,
        cancel: &CancellationToken,
    ) -> Result<ConfirmationStatus, BlockchainError> {
        cancel.cancelled().await;
        Ok(ConfirmationStatus::Abandoned)
    }
}

fn signer_body(to: &str, ids: serde_json::Value, expiry: &str) -> String {
    json!({
        "confirmation": { "from": ESCROW, "to": to, "ids": ids },
        "sig": {
            "expiryTimestamp": expiry,
            "v": 28,
            "r": format!("0x{}", "ab".repeat(32)),
            "s": format!("0x{}", "cd".repeat(32)),
        }
    })
    .to_string()
}

fn service(server: &Server) -> HttpSignerService {
    HttpSignerService::new(
        reqwest::Client::new(),
        &WithdrawalConfig {
            signer_url: format!("{}/signer/s/wc", server.url()),
            ..WithdrawalConfig::default()
        },
    )
}

#[tokio::test]
async fn test_hash_ids_are_signed_as_decimal_and_submitted_in_order() {
    let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();
    let client = wallet.address().to_string();
    let item_ids = vec![common::hash(0x2a), common::hash(7)];

    let mut server = Server::new_async().await;
    let exchange = server
        .mock("POST", "/signer/s/wc")
        .match_body(Matcher::PartialJson(json!({ "itemIds": ["42", "7"] })))
        .with_body(signer_body(&client, json!(["42", "0x07"]), EXPIRY_SECS))
        .expect(1)
        .create_async()
        .await;

    let submitter = RecordingSubmitter::default();
    let builder = WithdrawalRequestBuilder::new(wallet, service(&server), submitter.clone())
        .with_clock(Arc::new(FixedClock));
    let mut states = builder.subscribe();

    // Stop following the transaction once it is submitted.
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            if matches!(*states.borrow_and_update(), WithdrawalState::Submitted { .. }) {
                stop.cancel();
                break;
            }
        }
    });

    let tx_hash = builder.build_and_submit(&item_ids, &cancel).await.unwrap();

    assert_eq!(tx_hash, TxHash::repeat_byte(0x5e));
    assert_eq!(builder.state(), WithdrawalState::Submitted { tx_hash });
    exchange.assert_async().await;

    let calls = submitter.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].confirmation.ids, vec![U256::from(42), U256::from(7)]);
    assert_eq!(calls[0].sig.expiryTimestamp.to_string(), EXPIRY_SECS);
}

#[tokio::test]
async fn test_stale_expiry_from_signer_is_not_submitted() {
    let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();
    let client = wallet.address().to_string();

    let mut server = Server::new_async().await;
    let _exchange = server
        .mock("POST", "/signer/s/wc")
        .with_body(signer_body(&client, json!(["1"]), "1704067800"))
        .create_async()
        .await;

    let submitter = RecordingSubmitter::default();
    let builder = WithdrawalRequestBuilder::new(wallet, service(&server), submitter.clone())
        .with_clock(Arc::new(FixedClock));

    let err = builder
        .build_and_submit(&["1".to_string()], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WithdrawalError::ConfirmationMismatch(_)));
    assert!(matches!(builder.state(), WithdrawalState::Failed { .. }));
    assert!(submitter.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_signer_outage_fails_without_retry() {
    let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();

    let mut server = Server::new_async().await;
    let exchange = server
        .mock("POST", "/signer/s/wc")
        .with_status(503)
        .with_body("maintenance")
        .expect(1)
        .create_async()
        .await;

    let builder = WithdrawalRequestBuilder::new(wallet, service(&server), RecordingSubmitter::default())
        .with_clock(Arc::new(FixedClock));

    let err = builder
        .build_and_submit(&["1".to_string(), "2".to_string()], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WithdrawalError::SignatureExchange(_)));
    assert!(!err.is_user_cancellation());
    exchange.assert_async().await;
}

#[test]
fn test_expiry_fixture_matches_clock() {
    let expiry = ethscribe::withdrawal::message::expiry_for(FixedClock.now());
    assert_eq!(U256::from(expiry.timestamp() as u64).to_string(), EXPIRY_SECS);
}
