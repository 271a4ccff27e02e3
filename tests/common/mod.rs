//! In-memory chain and harness shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use ethers::types::{TxHash, U256};
use lp_agent::dex::MarketSource;
use lp_agent::errors::{ExecutionErrorKind, ReadError};
use lp_agent::execution::{TradeExecutor, TradeVenue, TxReceipt};
use lp_agent::models::{BalanceSnapshot, PoolSnapshot, TradeState};
use lp_agent::orchestrator::{CycleOutcome, CycleReport, Orchestrator, StopFlag};
use lp_agent::sizing::SizingConfig;
use lp_agent::store::StateStore;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MILLI: u64 = 1_000_000_000_000_000;
pub const ONE: u64 = 1_000 * MILLI;

/// Pool plus wallet. Each buy credits `buy_impact` tokens to the wallet and,
/// with `moves_pool`, pulls them out of the pool.
#[derive(Default)]
pub struct FakeChain {
    pub pool: Mutex<PoolSnapshot>,
    pub wallet: Mutex<BalanceSnapshot>,
    pub buy_impact: U256,
    pub moves_pool: bool,
    pub reads: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_submission: Option<usize>,
    pub submissions: AtomicUsize,
    pub read_delay: Option<Duration>,
}

impl FakeChain {
    pub fn new(pool: (u64, u64), native: u64, token: u64) -> Self {
        Self {
            pool: Mutex::new(PoolSnapshot {
                reserve_token: U256::from(pool.0),
                reserve_native: U256::from(pool.1),
            }),
            wallet: Mutex::new(BalanceSnapshot {
                native_balance: U256::from(native),
                token_balance: U256::from(token),
            }),
            ..Default::default()
        }
    }

    pub fn set_pool(&self, token: u64, native: u64) {
        *self.pool.lock().unwrap() = PoolSnapshot {
            reserve_token: U256::from(token),
            reserve_native: U256::from(native),
        };
    }

    fn submit(&self) -> Result<TxReceipt, ExecutionErrorKind> {
        let index = self.submissions.fetch_add(1, Ordering::SeqCst);
        if self.fail_submission == Some(index) {
            return Err(ExecutionErrorKind::Reverted {
                tx_hash: TxHash::from_low_u64_be(index as u64 + 1),
            });
        }
        Ok(TxReceipt {
            tx_hash: TxHash::from_low_u64_be(index as u64 + 1),
            block_number: None,
            gas_used: None,
        })
    }
}

#[async_trait]
impl MarketSource for FakeChain {
    async fn pool_snapshot(&self) -> Result<PoolSnapshot, ReadError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ReadError::rpc("getReserves", "connection refused"));
        }
        Ok(*self.pool.lock().unwrap())
    }

    async fn balances(&self) -> Result<BalanceSnapshot, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ReadError::rpc("eth_getBalance", "connection refused"));
        }
        Ok(*self.wallet.lock().unwrap())
    }
}

#[async_trait]
impl TradeVenue for FakeChain {
    async fn buy_tokens(&self, native_in: U256) -> Result<TxReceipt, ExecutionErrorKind> {
        let receipt = self.submit()?;
        if self.moves_pool {
            let mut pool = self.pool.lock().unwrap();
            pool.reserve_token -= self.buy_impact;
            pool.reserve_native += native_in;
        }
        let mut wallet = self.wallet.lock().unwrap();
        wallet.native_balance -= native_in;
        wallet.token_balance += self.buy_impact;
        Ok(receipt)
    }

    async fn sell_tokens(&self, token_in: U256) -> Result<TxReceipt, ExecutionErrorKind> {
        let receipt = self.submit()?;
        if self.moves_pool {
            self.pool.lock().unwrap().reserve_token += token_in;
        }
        self.wallet.lock().unwrap().token_balance -= token_in;
        Ok(receipt)
    }

    async fn router_allowance(&self) -> Result<U256, ExecutionErrorKind> {
        Ok(U256::MAX)
    }

    async fn approve_router(&self, _amount: U256) -> Result<TxReceipt, ExecutionErrorKind> {
        self.submit()
    }

    async fn token_balance(&self) -> Result<U256, ExecutionErrorKind> {
        Ok(self.wallet.lock().unwrap().token_balance)
    }
}

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub chain: Arc<FakeChain>,
    pub orchestrator: Arc<Orchestrator>,
}

impl Harness {
    pub fn new(chain: FakeChain, dry_run: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let chain = Arc::new(chain);
        let orchestrator = Arc::new(build(&chain, dir.path(), dry_run));
        Self {
            dir,
            chain,
            orchestrator,
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("tradeState.json")
    }

    pub fn stop_path(&self) -> PathBuf {
        self.dir.path().join("stop.flag")
    }

    pub fn seed(&self, state: &TradeState) {
        std::fs::write(self.state_path(), serde_json::to_string(state).unwrap()).unwrap();
    }

    pub fn saved(&self) -> TradeState {
        serde_json::from_str(&std::fs::read_to_string(self.state_path()).unwrap()).unwrap()
    }

    pub async fn cycle(&self) -> CycleReport {
        match self.orchestrator.run_cycle().await {
            CycleOutcome::Completed(report) => report,
            other => panic!("expected a completed cycle, got {other:?}"),
        }
    }
}

pub fn build(chain: &Arc<FakeChain>, dir: &Path, dry_run: bool) -> Orchestrator {
    Orchestrator::new(
        chain.clone(),
        TradeExecutor::new(chain.clone(), dry_run),
        StateStore::new(dir.join("tradeState.json")),
        StopFlag::new(dir.join("stop.flag")),
        SizingConfig::default(),
    )
}

pub fn reserves(token: u64, native: u64) -> TradeState {
    TradeState {
        last_reserve_token: U256::from(token),
        last_reserve_native: U256::from(native),
        ..TradeState::default()
    }
}
