//! Withdrawal pipeline types.

use alloy::primitives::{Address, TxHash, B256, U256};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::blockchain::contract::{bulkWithdrawItemsCall, ConfirmationSignature, TransferConfirmation};

/// Errors that end a withdrawal attempt. None of them is retried; the
/// caller starts over from a freshly verified item set.
#[derive(Debug, Error)]
pub enum WithdrawalError {
    #[error("no items to withdraw")]
    EmptyBatch,

    #[error("invalid item id '{0}'")]
    InvalidItemId(String),

    /// The user declined to sign or abandoned the attempt before submission.
    #[error("withdrawal cancelled by user")]
    UserCancelled,

    #[error("message signing failed: {0}")]
    Signing(String),

    #[error("signature exchange failed: {0}")]
    SignatureExchange(String),

    /// The co-signed confirmation does not match what the user signed.
    #[error("confirmation rejected: {0}")]
    ConfirmationMismatch(String),

    #[error("chain submission failed: {0}")]
    ChainSubmission(String),
}

impl WithdrawalError {
    /// Whether this failure should be shown as a cancellation rather than an error.
    pub fn is_user_cancellation(&self) -> bool {
        matches!(self, WithdrawalError::UserCancelled)
    }
}

/// Result type for the withdrawal pipeline.
pub type WithdrawalResult<T> = Result<T, WithdrawalError>;

/// Where a withdrawal attempt currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WithdrawalState {
    #[default]
    Idle,
    PendingSignature,
    PendingConfirmationExchange,
    PendingChainSubmission,
    Submitted { tx_hash: TxHash },
    Confirmed { tx_hash: TxHash, block_number: u64 },
    Failed { reason: String },
}

impl WithdrawalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalState::Idle => "idle",
            WithdrawalState::PendingSignature => "pending_signature",
            WithdrawalState::PendingConfirmationExchange => "pending_confirmation_exchange",
            WithdrawalState::PendingChainSubmission => "pending_chain_submission",
            WithdrawalState::Submitted { .. } => "submitted",
            WithdrawalState::Confirmed { .. } => "confirmed",
            WithdrawalState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WithdrawalState::Confirmed { .. } | WithdrawalState::Failed { .. })
    }
}

/// Signer service signature over a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationSig {
    /// Unix seconds after which the contract rejects the confirmation.
    #[serde(deserialize_with = "de_u256")]
    pub expiry_timestamp: U256,
    #[serde(deserialize_with = "de_u8")]
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

/// Co-signed confirmation returned by the signer service.
///
/// `ids` order is part of what was signed; it is passed to the contract
/// exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalConfirmation {
    pub from: Address,
    pub to: Address,
    #[serde(deserialize_with = "de_u256_list")]
    pub ids: Vec<U256>,
    pub signature: ConfirmationSig,
}

impl WithdrawalConfirmation {
    /// Check the confirmation against the ids the user signed and the
    /// expiry embedded in the signed message.
    pub fn validate(
        &self,
        signed_ids: &[U256],
        expected_expiry_secs: u64,
        now_secs: u64,
    ) -> WithdrawalResult<()> {
        if self.ids != signed_ids {
            return Err(WithdrawalError::ConfirmationMismatch(format!(
                "ids {:?} do not match signed ids {:?}",
                self.ids, signed_ids
            )));
        }

        let expiry = self.signature.expiry_timestamp;
        if expiry != U256::from(expected_expiry_secs) {
            return Err(WithdrawalError::ConfirmationMismatch(format!(
                "expiry {} does not match signed expiry {}",
                expiry, expected_expiry_secs
            )));
        }
        if expiry <= U256::from(now_secs) {
            return Err(WithdrawalError::ConfirmationMismatch(format!(
                "confirmation expired at {}",
                expiry
            )));
        }

        Ok(())
    }

    /// Contract call carrying both tuples in ABI field order.
    pub fn to_call(&self) -> bulkWithdrawItemsCall {
        bulkWithdrawItemsCall {
            confirmation: TransferConfirmation {
                from: self.from,
                to: self.to,
                ids: self.ids.clone(),
            },
            sig: ConfirmationSignature {
                expiryTimestamp: self.signature.expiry_timestamp,
                v: self.signature.v,
                r: self.signature.r,
                s: self.signature.s,
            },
        }
    }
}

/// Accept decimal strings, 0x-hex strings, or JSON integers.
fn value_to_u256(value: &serde_json::Value) -> Result<U256, String> {
    match value {
        serde_json::Value::String(s) => s
            .trim()
            .parse::<U256>()
            .map_err(|e| format!("invalid uint256 '{}': {}", s, e)),
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| format!("invalid uint256 {}", n)),
        other => Err(format!("expected uint256, got {}", other)),
    }
}

fn de_u256<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    value_to_u256(&value).map_err(serde::de::Error::custom)
}

fn de_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = de_u256(deserializer)?;
    if value > U256::from(u8::MAX) {
        return Err(serde::de::Error::custom(format!("{} does not fit in uint8", value)));
    }
    Ok(value.to::<u8>())
}

pub(crate) fn de_u256_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<U256>, D::Error> {
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    values
        .iter()
        .map(value_to_u256)
        .collect::<Result<_, _>>()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn confirmation(ids: Vec<u64>, expiry: u64) -> WithdrawalConfirmation {
        WithdrawalConfirmation {
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            ids: ids.into_iter().map(U256::from).collect(),
            signature: ConfirmationSig {
                expiry_timestamp: U256::from(expiry),
                v: 28,
                r: B256::repeat_byte(3),
                s: B256::repeat_byte(4),
            },
        }
    }

    #[test]
    fn test_flexible_number_decoding() {
        let sig: ConfirmationSig = serde_json::from_value(json!({
            "expiryTimestamp": "1700000400",
            "v": 27,
            "r": format!("0x{}", "11".repeat(32)),
            "s": format!("0x{}", "22".repeat(32)),
        }))
        .unwrap();
        assert_eq!(sig.expiry_timestamp, U256::from(1_700_000_400u64));
        assert_eq!(sig.v, 27);

        let ids: Vec<U256> = json!(["12", "0x0c", 12])
            .as_array()
            .unwrap()
            .iter()
            .map(|v| value_to_u256(v).unwrap())
            .collect();
        assert_eq!(ids, vec![U256::from(12); 3]);
    }

    #[test]
    fn test_oversized_v_rejected() {
        let result: Result<ConfirmationSig, _> = serde_json::from_value(json!({
            "expiryTimestamp": "1",
            "v": 300,
            "r": format!("0x{}", "11".repeat(32)),
            "s": format!("0x{}", "22".repeat(32)),
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_reordered_ids_rejected() {
        let signed = [U256::from(1), U256::from(2)];
        let reordered = confirmation(vec![2, 1], 2_000);
        let err = reordered.validate(&signed, 2_000, 1_000).unwrap_err();
        assert!(matches!(err, WithdrawalError::ConfirmationMismatch(_)));

        assert!(confirmation(vec![1, 2], 2_000).validate(&signed, 2_000, 1_000).is_ok());
    }

    #[test]
    fn test_expiry_must_match_and_be_in_future() {
        let signed = [U256::from(1)];
        assert!(confirmation(vec![1], 2_600).validate(&signed, 2_000, 1_000).is_err());
        assert!(confirmation(vec![1], 2_000).validate(&signed, 2_000, 2_000).is_err());
    }

    #[test]
    fn test_call_keeps_tuple_order() {
        let call = confirmation(vec![5, 3], 2_000).to_call();
        assert_eq!(call.confirmation.ids, vec![U256::from(5), U256::from(3)]);
        assert_eq!(call.sig.expiryTimestamp, U256::from(2_000));
        assert_eq!(call.sig.v, 28);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(WithdrawalState::default().as_str(), "idle");
        assert!(WithdrawalState::Failed { reason: "x".into() }.is_terminal());
        assert!(!WithdrawalState::Submitted { tx_hash: TxHash::ZERO }.is_terminal());
    }
}
