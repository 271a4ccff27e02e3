//! Chain access for a single V2-style token/native pool.
//!
//! `MarketSource` is the read side consumed by the orchestrator; the
//! `EthersChain` client implements it together with the executor's
//! `TradeVenue` port.

use crate::errors::ReadError;
use crate::models::{BalanceSnapshot, PoolSnapshot};
use async_trait::async_trait;

pub mod client;
pub mod reserves;

pub use client::EthersChain;
pub use reserves::order_reserves;

/// Reads pool reserves and wallet balances.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn pool_snapshot(&self) -> Result<PoolSnapshot, ReadError>;
    async fn balances(&self) -> Result<BalanceSnapshot, ReadError>;
}
