//! Runs a `TradeDecision` against a `TradeVenue`, or simulates it in dry run.

use super::venue::{TradeVenue, TxReceipt};
use crate::errors::{ExecutionError, ExecutionErrorKind};
use crate::models::{TradeAction, TradeActionKind, TradeDecision, TradeState};
use crate::utils::display_units;
use ethers::types::U256;
use std::sync::Arc;
use tracing::{error, info, warn};

/// One transaction that made it on-chain during this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTrade {
    pub kind: TradeActionKind,
    pub amount: U256,
    pub receipt: TxReceipt,
}

/// What happened to a decision's actions.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Confirmed transactions, approvals included, in submission order.
    pub submitted: Vec<SubmittedTrade>,
    /// Actions that were only logged because of dry run.
    pub simulated: Vec<TradeAction>,
    /// The action that stopped the cycle, if any. Later actions were skipped.
    pub failure: Option<ExecutionError>,
}

impl ExecutionReport {
    pub fn touched_chain(&self) -> bool {
        !self.submitted.is_empty()
    }

    fn record(&mut self, kind: TradeActionKind, amount: U256, receipt: TxReceipt) {
        info!(
            action = %kind,
            %amount,
            units = %display_units(amount),
            tx = ?receipt.tx_hash,
            block = ?receipt.block_number,
            gas_used = ?receipt.gas_used,
            "[EXEC] confirmed"
        );
        self.submitted.push(SubmittedTrade {
            kind,
            amount,
            receipt,
        });
    }
}

pub struct TradeExecutor {
    venue: Arc<dyn TradeVenue>,
    dry_run: bool,
}

impl TradeExecutor {
    pub fn new(venue: Arc<dyn TradeVenue>, dry_run: bool) -> Self {
        Self { venue, dry_run }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Execute `decision` in order, recording completed trades into `state`.
    ///
    /// The first failure aborts the remaining actions. Trades confirmed
    /// before it stay recorded in `state`: they are final on-chain.
    pub async fn execute(
        &self,
        decision: &TradeDecision,
        state: &mut TradeState,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for action in &decision.actions {
            if self.dry_run {
                info!(
                    action = %action.kind(),
                    amount = %action.amount(),
                    units = %display_units(action.amount()),
                    "[EXEC] dry run, not submitted"
                );
                report.simulated.push(*action);
                continue;
            }
            if let Err(e) = self.execute_action(*action, state, &mut report).await {
                error!(
                    action = %e.action,
                    amount = %e.amount,
                    error = %e.kind,
                    completed = report.submitted.len(),
                    "[EXEC] action failed, skipping the rest of this cycle"
                );
                report.failure = Some(e);
                break;
            }
        }
        report
    }

    async fn execute_action(
        &self,
        action: TradeAction,
        state: &mut TradeState,
        report: &mut ExecutionReport,
    ) -> Result<(), ExecutionError> {
        match action {
            TradeAction::CompensatingBuy(amount) => {
                let receipt = self.buy(TradeActionKind::CompensatingBuy, amount).await?;
                report.record(TradeActionKind::CompensatingBuy, amount, receipt);
            }
            TradeAction::DynamicBuy(amount) => {
                let receipt = self.buy(TradeActionKind::DynamicBuy, amount).await?;
                state.last_buy_amount = amount;
                report.record(TradeActionKind::DynamicBuy, amount, receipt);
            }
            TradeAction::DynamicSell(planned) => {
                let fail = |kind| ExecutionError {
                    action: TradeActionKind::DynamicSell,
                    amount: planned,
                    kind,
                };
                let held = self.venue.token_balance().await.map_err(fail)?;
                let amount = planned.min(held);
                if amount.is_zero() {
                    warn!(%planned, "[EXEC] token balance is empty, nothing to sell");
                    return Ok(());
                }
                self.ensure_allowance(amount, report).await?;
                let receipt = self.venue.sell_tokens(amount).await.map_err(fail)?;
                state.last_sell_amount = amount;
                report.record(TradeActionKind::DynamicSell, amount, receipt);
            }
        }
        Ok(())
    }

    async fn buy(&self, kind: TradeActionKind, amount: U256) -> Result<TxReceipt, ExecutionError> {
        self.venue
            .buy_tokens(amount)
            .await
            .map_err(|e| ExecutionError {
                action: kind,
                amount,
                kind: e,
            })
    }

    /// Approve the router for exactly `amount` when the allowance falls short.
    async fn ensure_allowance(
        &self,
        amount: U256,
        report: &mut ExecutionReport,
    ) -> Result<(), ExecutionError> {
        let fail = |kind: ExecutionErrorKind| ExecutionError {
            action: TradeActionKind::Approve,
            amount,
            kind,
        };
        let allowance = self.venue.router_allowance().await.map_err(fail)?;
        if allowance >= amount {
            return Ok(());
        }
        info!(%amount, %allowance, "[EXEC] allowance short, approving router");
        let receipt = self.venue.approve_router(amount).await.map_err(fail)?;
        report.record(TradeActionKind::Approve, amount, receipt);
        Ok(())
    }
}
