use crate::errors::ExecutionErrorKind;
use async_trait::async_trait;
use ethers::types::{TransactionReceipt, TxHash, U256, U64};

/// Minimal record of a mined, successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<U64>,
    pub gas_used: Option<U256>,
}

/// State-changing operations against the router and the tracked token.
///
/// Every submission estimates gas, adds a margin, sets a router deadline and
/// only returns `Ok` for a receipt with a successful status.
#[async_trait]
pub trait TradeVenue: Send + Sync {
    /// Swap exactly `native_in` of the native asset for tokens.
    async fn buy_tokens(&self, native_in: U256) -> Result<TxReceipt, ExecutionErrorKind>;
    /// Swap exactly `token_in` tokens for the native asset.
    async fn sell_tokens(&self, token_in: U256) -> Result<TxReceipt, ExecutionErrorKind>;
    async fn router_allowance(&self) -> Result<U256, ExecutionErrorKind>;
    async fn approve_router(&self, amount: U256) -> Result<TxReceipt, ExecutionErrorKind>;
    async fn token_balance(&self) -> Result<U256, ExecutionErrorKind>;
}

/// Accept only a present receipt with status 1.
pub fn check_receipt(
    receipt: Option<TransactionReceipt>,
) -> Result<TxReceipt, ExecutionErrorKind> {
    let receipt = receipt.ok_or(ExecutionErrorKind::MissingReceipt)?;
    if receipt.status != Some(U64::one()) {
        return Err(ExecutionErrorKind::Reverted {
            tx_hash: receipt.transaction_hash,
        });
    }
    Ok(TxReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    })
}
