//! Escrow market contract bindings.
//!
//! Only the batch-withdrawal entry point is bound. Field order inside both
//! tuples is part of the ABI and must not change.

use alloy::sol;

sol! {
    /// Transfer confirmation co-signed by the market's signer service.
    #[derive(Debug, PartialEq, Eq)]
    struct TransferConfirmation {
        address from;
        address to;
        uint256[] ids;
    }

    /// Signer service signature over a confirmation.
    #[derive(Debug, PartialEq, Eq)]
    struct ConfirmationSignature {
        uint256 expiryTimestamp;
        uint8 v;
        bytes32 r;
        bytes32 s;
    }

    /// Withdraw every escrowed item listed in `confirmation` back to its owner.
    #[derive(Debug, PartialEq, Eq)]
    function bulkWithdrawItems(TransferConfirmation confirmation, ConfirmationSignature sig) external;
}
