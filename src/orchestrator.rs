//! Cycle orchestration: read, decide, execute, persist, then wait.
//!
//! One cycle runs at a time. The timer is only re-armed after the previous
//! cycle has persisted, and an in-flight guard rejects any overlapping call
//! to `run_cycle` on a shared orchestrator. An interrupt never cuts a cycle
//! short: it is noticed before the next cycle or during the wait.

use crate::dex::MarketSource;
use crate::errors::{AppError, ExecutionError, ReadError};
use crate::execution::{SubmittedTrade, TradeExecutor};
use crate::models::{BalanceSnapshot, PoolSnapshot, TradeDecision, TradeState};
use crate::sizing::{SizingConfig, decide};
use crate::store::StateStore;
use crate::utils::display_units;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Reading,
    Deciding,
    Executing,
    Persisting,
}

/// Summary of a cycle that got past the read phase.
#[derive(Debug)]
pub struct CycleReport {
    pub decision: TradeDecision,
    /// Transactions confirmed on-chain, approvals included.
    pub submitted: Vec<SubmittedTrade>,
    pub execution_error: Option<ExecutionError>,
    /// The state written (or attempted) at the end of the cycle.
    pub state: TradeState,
    pub persisted: bool,
}

#[derive(Debug)]
pub enum CycleOutcome {
    /// The stop flag was present; nothing was read or written.
    Stopped,
    /// Another cycle was still in flight.
    AlreadyRunning,
    ReadFailed(ReadError),
    /// The state file exists but could not be read; nothing was traded or written.
    StateUnreadable(AppError),
    Completed(CycleReport),
}

/// Filesystem sentinel asking the agent to stop before its next cycle.
#[derive(Debug, Clone)]
pub struct StopFlag {
    path: PathBuf,
}

impl StopFlag {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An unreadable location counts as raised.
    pub async fn is_raised(&self) -> bool {
        match tokio::fs::try_exists(&self.path).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "[STOP] cannot check stop flag");
                true
            }
        }
    }
}

/// Marks a cycle as in flight until dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Orchestrator {
    market: Arc<dyn MarketSource>,
    executor: TradeExecutor,
    store: StateStore,
    stop_flag: StopFlag,
    sizing: SizingConfig,
    in_flight: AtomicBool,
}

impl Orchestrator {
    pub fn new(
        market: Arc<dyn MarketSource>,
        executor: TradeExecutor,
        store: StateStore,
        stop_flag: StopFlag,
        sizing: SizingConfig,
    ) -> Self {
        Self {
            market,
            executor,
            store,
            stop_flag,
            sizing,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run cycles until the stop flag appears, Ctrl-C arrives, or after the
    /// first cycle when `once` is set.
    pub async fn run(&self, interval: Duration, once: bool) {
        let (interrupt, shutdown) = watch::channel(false);
        let listener = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("[STOP] interrupt received, stopping after the current cycle");
                    let _ = interrupt.send(true);
                }
                Err(e) => warn!(error = %e, "[STOP] cannot listen for interrupts"),
            }
        });
        self.run_until(interval, once, shutdown).await;
        listener.abort();
    }

    /// Scheduler loop. Setting `shutdown` to `true` ends it between cycles.
    pub async fn run_until(
        &self,
        interval: Duration,
        once: bool,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            interval_secs = interval.as_secs(),
            once,
            dry_run = self.executor.dry_run(),
            state_file = %self.store.path().display(),
            stop_flag = %self.stop_flag.path().display(),
            "[CYCLE] scheduler started"
        );
        loop {
            if *shutdown.borrow() {
                info!("[STOP] shutdown requested, not starting a cycle");
                break;
            }
            if let CycleOutcome::Stopped = self.run_cycle().await {
                break;
            }
            if once {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                true = requested(&mut shutdown) => {
                    info!("[STOP] shutdown requested, exiting between cycles");
                    break;
                }
            }
        }
    }

    /// Run one full cycle. Failures are logged and folded into the outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self.stop_flag.is_raised().await {
            info!(path = %self.stop_flag.path().display(), "[STOP] stop flag detected, not starting a cycle");
            return CycleOutcome::Stopped;
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("[CYCLE] previous cycle still in flight, skipping");
            return CycleOutcome::AlreadyRunning;
        };

        enter(CyclePhase::Reading);
        let (pool, balances) = match self.read_market().await {
            Ok(read) => read,
            Err(e) => {
                error!(error = %e, "[READ] market read failed, cycle aborted");
                enter(CyclePhase::Idle);
                return CycleOutcome::ReadFailed(e);
            }
        };
        info!(
            native = %display_units(balances.native_balance),
            token = %balances.token_balance,
            reserve_token = %pool.reserve_token,
            reserve_native = %pool.reserve_native,
            "[READ] market observed"
        );

        enter(CyclePhase::Deciding);
        let previous = match self.store.load().await {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "[STATE] state file unreadable, cycle aborted");
                enter(CyclePhase::Idle);
                return CycleOutcome::StateUnreadable(e);
            }
        };
        let decision = decide(&pool, &balances, &previous, &self.sizing);
        log_decision(&decision, &balances, &previous);

        enter(CyclePhase::Executing);
        let mut next = previous;
        let report = self.executor.execute(&decision, &mut next).await;
        if let Some(e) = &report.failure {
            error!(
                action = %e.action,
                amount = %e.amount,
                native = %display_units(balances.native_balance),
                token = %balances.token_balance,
                "[CYCLE] execution stopped early, persisting completed trades"
            );
        }

        enter(CyclePhase::Persisting);
        let reserves = if report.touched_chain() {
            self.refresh_reserves(decision.reserves).await
        } else {
            decision.reserves
        };
        next.record_reserves(&reserves);
        let persisted = match self.store.save(&next).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "[STATE] failed to persist, next cycle starts from stale state");
                false
            }
        };

        enter(CyclePhase::Idle);
        info!(
            planned = decision.actions.len(),
            submitted = report.submitted.len(),
            last_tx = ?report.submitted.last().map(|t| t.receipt.tx_hash),
            failed = report.failure.is_some(),
            persisted,
            "[CYCLE] finished"
        );
        CycleOutcome::Completed(CycleReport {
            submitted: report.submitted,
            execution_error: report.failure,
            decision,
            state: next,
            persisted,
        })
    }

    async fn read_market(&self) -> Result<(PoolSnapshot, BalanceSnapshot), ReadError> {
        let balances = self.market.balances().await?;
        let pool = self.market.pool_snapshot().await?;
        Ok((pool, balances))
    }

    /// Re-read reserves after our own trades so they become the next baseline.
    async fn refresh_reserves(&self, fallback: PoolSnapshot) -> PoolSnapshot {
        match self.market.pool_snapshot().await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "[READ] post-trade reserve refresh failed, keeping pre-trade reserves");
                fallback
            }
        }
    }
}

/// Resolves to `true` once shutdown is requested, `false` if it never can be.
async fn requested(shutdown: &mut watch::Receiver<bool>) -> bool {
    shutdown.wait_for(|stop| *stop).await.is_ok()
}

fn enter(phase: CyclePhase) {
    debug!(?phase, "[CYCLE] phase");
}

fn log_decision(decision: &TradeDecision, balances: &BalanceSnapshot, previous: &TradeState) {
    if let Some(diff) = decision.external_sale {
        info!(%diff, last_reserve_token = %previous.last_reserve_token, "[SIZE] external sale detected");
    }
    if decision.is_noop() {
        info!(
            native = %display_units(balances.native_balance),
            change_permille = %decision.change_permille,
            "[SIZE] no action this cycle"
        );
        return;
    }
    for action in &decision.actions {
        info!(
            action = %action.kind(),
            amount = %action.amount(),
            change_permille = %decision.change_permille,
            "[SIZE] planned"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = InFlightGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(InFlightGuard::acquire(&flag).is_none());
        drop(first);
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn stop_flag_follows_file_presence() {
        let dir = tempfile::tempdir().unwrap();
        let flag = StopFlag::new(dir.path().join("stop.flag"));
        assert!(!flag.is_raised().await);
        std::fs::write(flag.path(), "").unwrap();
        assert!(flag.is_raised().await);
    }
}
