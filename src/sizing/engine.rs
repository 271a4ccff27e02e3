use super::types::SizingConfig;
use crate::models::{BalanceSnapshot, PoolSnapshot, TradeAction, TradeDecision, TradeState};
use ethers::types::U256;

/// Decide this cycle's trades from the current market and the previous state.
///
/// Pure: no I/O, no clock. The returned decision always carries `pool` as the
/// reserves to persist, whether or not any action is planned.
pub fn decide(
    pool: &PoolSnapshot,
    balances: &BalanceSnapshot,
    previous: &TradeState,
    config: &SizingConfig,
) -> TradeDecision {
    let change_permille = reserve_change_permille(pool.reserve_token, previous.last_reserve_token);
    let external_sale = (pool.reserve_token < previous.last_reserve_token)
        .then(|| previous.last_reserve_token - pool.reserve_token);

    let mut decision = TradeDecision {
        actions: Vec::new(),
        reserves: *pool,
        external_sale,
        change_permille,
    };

    if balances.native_balance < config.gas_floor {
        return decision;
    }

    // Native balance left for sizing once earlier actions are accounted for.
    let mut available = balances.native_balance;

    if external_sale.is_some() && available > config.compensation_min_balance {
        let amount = config.compensating_buy.min(available);
        decision.actions.push(TradeAction::CompensatingBuy(amount));
        available -= amount;
    }

    let buy = dynamic_buy_amount(available, change_permille, config);
    if buy > config.dust {
        decision.actions.push(TradeAction::DynamicBuy(buy));
    }

    let sell = sell_amount(balances.token_balance, previous);
    if !sell.is_zero() {
        decision.actions.push(TradeAction::DynamicSell(sell));
    }

    decision
}

/// `|current - previous| * 1000 / previous`, or zero without a previous reserve.
pub fn reserve_change_permille(current: U256, previous: U256) -> U256 {
    if previous.is_zero() {
        return U256::zero();
    }
    let diff = if current >= previous {
        current - previous
    } else {
        previous - current
    };
    diff.saturating_mul(U256::from(1000u64)) / previous
}

fn dynamic_buy_amount(available: U256, change_permille: U256, config: &SizingConfig) -> U256 {
    let share = available.saturating_mul(U256::from(config.buy_share_bps)) / U256::from(10_000u64);
    let mut amount = share.min(config.buy_cap);
    if change_permille > U256::from(config.boost_threshold_permille) {
        amount = amount * U256::from(config.boost_num) / U256::from(config.boost_den);
    }
    amount.min(available.saturating_sub(config.gas_reserve))
}

fn sell_amount(token_balance: U256, previous: &TradeState) -> U256 {
    if previous.last_buy_amount.is_zero() {
        token_balance
    } else {
        previous.last_sell_amount.min(token_balance)
    }
}
