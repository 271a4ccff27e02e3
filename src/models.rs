//! Shared data structures used throughout the application.

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record carried between cycles. All amounts are raw on-chain integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeState {
    /// Native asset spent on the most recent dynamic buy.
    #[serde(default, alias = "lastBuyBNB", with = "decimal_u256")]
    pub last_buy_amount: U256,
    /// Tokens sold on the most recent sell.
    #[serde(default, alias = "lastSellTokens", with = "decimal_u256")]
    pub last_sell_amount: U256,
    #[serde(default, alias = "lastReserveBRICS", with = "decimal_u256")]
    pub last_reserve_token: U256,
    #[serde(default, alias = "lastReserveBNB", with = "decimal_u256")]
    pub last_reserve_native: U256,
}

impl TradeState {
    /// Replace the reserve baseline with a fresh observation.
    pub fn record_reserves(&mut self, pool: &PoolSnapshot) {
        self.last_reserve_token = pool.reserve_token;
        self.last_reserve_native = pool.reserve_native;
    }
}

/// Pool reserves already ordered as (tracked token, native asset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub reserve_token: U256,
    pub reserve_native: U256,
}

/// Wallet holdings at the start of a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub native_balance: U256,
    pub token_balance: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeActionKind {
    CompensatingBuy,
    DynamicBuy,
    DynamicSell,
    Approve,
}

impl fmt::Display for TradeActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CompensatingBuy => "compensating buy",
            Self::DynamicBuy => "dynamic buy",
            Self::DynamicSell => "dynamic sell",
            Self::Approve => "approve",
        };
        f.write_str(name)
    }
}

/// A single planned trade. Buy amounts are native units, sell amounts are token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    CompensatingBuy(U256),
    DynamicBuy(U256),
    DynamicSell(U256),
}

impl TradeAction {
    pub fn kind(&self) -> TradeActionKind {
        match self {
            Self::CompensatingBuy(_) => TradeActionKind::CompensatingBuy,
            Self::DynamicBuy(_) => TradeActionKind::DynamicBuy,
            Self::DynamicSell(_) => TradeActionKind::DynamicSell,
        }
    }

    pub fn amount(&self) -> U256 {
        match self {
            Self::CompensatingBuy(a) | Self::DynamicBuy(a) | Self::DynamicSell(a) => *a,
        }
    }
}

/// Output of the sizing engine for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeDecision {
    /// Actions in execution order.
    pub actions: Vec<TradeAction>,
    /// Reserves to persist once the cycle ends.
    pub reserves: PoolSnapshot,
    /// Token reserve drop since the previous cycle, if any.
    pub external_sale: Option<U256>,
    /// Relative reserve change scaled by 1000.
    pub change_permille: U256,
}

impl TradeDecision {
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Amounts are stored as decimal strings so the file stays readable and lossless.
mod decimal_u256 {
    use ethers::types::U256;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(value: &U256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Number(n) => Ok(U256::from(n)),
            Raw::Text(s) if s.trim().is_empty() => Ok(U256::zero()),
            Raw::Text(s) => U256::from_dec_str(s.trim()).map_err(D::Error::custom),
        }
    }
}
