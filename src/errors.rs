use ethers::types::{TxHash, U256};
use thiserror::Error;

use crate::models::TradeActionKind;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persist error: {0}")]
    Persist(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// Failures while reading balances or pool state. Aborts the current cycle only.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("rpc call `{call}` failed: {message}")]
    Rpc { call: &'static str, message: String },

    #[error("no pool exists for token {token:?} / {native:?}")]
    PoolMissing {
        token: ethers::types::Address,
        native: ethers::types::Address,
    },

    #[error(
        "pool assets {token0:?}/{token1:?} do not match token {token:?} and native {native:?}"
    )]
    AssetMismatch {
        token0: ethers::types::Address,
        token1: ethers::types::Address,
        token: ethers::types::Address,
        native: ethers::types::Address,
    },
}

impl ReadError {
    pub fn rpc(call: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Rpc {
            call,
            message: err.to_string(),
        }
    }
}

/// What went wrong with a single on-chain submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionErrorKind {
    #[error("gas estimation failed: {0}")]
    GasEstimate(String),

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("no receipt returned")]
    MissingReceipt,

    #[error("transaction {tx_hash:?} reverted")]
    Reverted { tx_hash: TxHash },

    #[error("balance query failed: {0}")]
    BalanceQuery(String),
}

/// A failed trade action, with enough context for a postmortem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action} of {amount} failed: {kind}")]
pub struct ExecutionError {
    pub action: TradeActionKind,
    pub amount: U256,
    pub kind: ExecutionErrorKind,
}
