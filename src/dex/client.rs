use super::{MarketSource, order_reserves};
use crate::config::{AppConfig, GasConfig};
use crate::errors::{ExecutionErrorKind, ReadError};
use crate::execution::{TradeVenue, TxReceipt, check_receipt};
use crate::models::{BalanceSnapshot, PoolSnapshot};
use crate::utils::deadline_after;
use async_trait::async_trait;
use ethers::{
    abi::Detokenize,
    contract::{ContractCall, abigen},
    providers::Middleware,
    types::{Address, U256},
};
use std::sync::Arc;
use tracing::debug;

abigen!(
    UniswapV2Factory,
    r"[
        function getPair(address tokenA, address tokenB) external view returns (address pair)
    ]",
);

abigen!(
    UniswapV2Pair,
    r"[
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
        function token0() external view returns (address)
        function token1() external view returns (address)
    ]",
);

abigen!(
    Erc20,
    r"[
        function balanceOf(address owner) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]",
);

abigen!(
    UniswapV2Router,
    r"[
        function swapExactETHForTokensSupportingFeeOnTransferTokens(uint256 amountOutMin, address[] path, address to, uint256 deadline) external payable
        function swapExactTokensForETHSupportingFeeOnTransferTokens(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) external
    ]",
);

/// Handle for the configured wallet, token, pool and router.
///
/// Generic over the middleware so the same client serves dry runs (plain
/// provider) and live trading (signer middleware).
pub struct EthersChain<M> {
    client: Arc<M>,
    wallet: Address,
    token_address: Address,
    wrapped_native: Address,
    router_address: Address,
    factory: UniswapV2Factory<M>,
    token: Erc20<M>,
    router: UniswapV2Router<M>,
    gas: GasConfig,
}

impl<M: Middleware + 'static> EthersChain<M> {
    pub fn new(client: Arc<M>, wallet: Address, config: &AppConfig) -> Self {
        Self {
            factory: UniswapV2Factory::new(config.factory, client.clone()),
            token: Erc20::new(config.token, client.clone()),
            router: UniswapV2Router::new(config.router, client.clone()),
            client,
            wallet,
            token_address: config.token,
            wrapped_native: config.wrapped_native,
            router_address: config.router,
            gas: config.gas,
        }
    }

    async fn pair(&self) -> Result<UniswapV2Pair<M>, ReadError> {
        let pair = self
            .factory
            .get_pair(self.token_address, self.wrapped_native)
            .call()
            .await
            .map_err(|e| ReadError::rpc("getPair", e))?;
        if pair.is_zero() {
            return Err(ReadError::PoolMissing {
                token: self.token_address,
                native: self.wrapped_native,
            });
        }
        Ok(UniswapV2Pair::new(pair, self.client.clone()))
    }

    fn buy_call(&self, native_in: U256) -> ContractCall<M, ()> {
        self.router
            .swap_exact_eth_for_tokens_supporting_fee_on_transfer_tokens(
                U256::zero(),
                vec![self.wrapped_native, self.token_address],
                self.wallet,
                deadline_after(self.gas.deadline),
            )
            .from(self.wallet)
            .value(native_in)
    }

    fn sell_call(&self, token_in: U256) -> ContractCall<M, ()> {
        self.router
            .swap_exact_tokens_for_eth_supporting_fee_on_transfer_tokens(
                token_in,
                U256::zero(),
                vec![self.token_address, self.wrapped_native],
                self.wallet,
                deadline_after(self.gas.deadline),
            )
            .from(self.wallet)
    }

    fn approve_call(&self, amount: U256) -> ContractCall<M, bool> {
        self.token
            .approve(self.router_address, amount)
            .from(self.wallet)
    }

    /// Set the call's gas limit to the node's estimate plus `margin`.
    async fn with_padded_gas<D: Detokenize>(
        &self,
        call: ContractCall<M, D>,
        margin: u64,
    ) -> Result<ContractCall<M, D>, ExecutionErrorKind> {
        let estimate = call
            .estimate_gas()
            .await
            .map_err(|e| ExecutionErrorKind::GasEstimate(e.to_string()))?;
        let gas = estimate + U256::from(margin);
        debug!(%estimate, %gas, "[EXEC] gas estimated");
        Ok(call.gas(gas))
    }

    /// Estimate, pad, send and wait for a successful receipt.
    async fn submit<D: Detokenize>(
        &self,
        call: ContractCall<M, D>,
        margin: u64,
    ) -> Result<TxReceipt, ExecutionErrorKind> {
        let call = self.with_padded_gas(call, margin).await?;
        let pending = call
            .send()
            .await
            .map_err(|e| ExecutionErrorKind::Submission(e.to_string()))?;
        let tx_hash = *pending;
        debug!(?tx_hash, "[EXEC] submitted, waiting for receipt");
        let receipt = pending
            .await
            .map_err(|e| ExecutionErrorKind::Submission(e.to_string()))?;
        check_receipt(receipt)
    }
}

#[async_trait]
impl<M: Middleware + 'static> MarketSource for EthersChain<M> {
    async fn pool_snapshot(&self) -> Result<PoolSnapshot, ReadError> {
        let pair = self.pair().await?;
        let (reserve0, reserve1, _) = pair
            .get_reserves()
            .call()
            .await
            .map_err(|e| ReadError::rpc("getReserves", e))?;
        let token0 = pair
            .token_0()
            .call()
            .await
            .map_err(|e| ReadError::rpc("token0", e))?;
        let token1 = pair
            .token_1()
            .call()
            .await
            .map_err(|e| ReadError::rpc("token1", e))?;
        order_reserves(
            token0,
            token1,
            U256::from(reserve0),
            U256::from(reserve1),
            self.token_address,
            self.wrapped_native,
        )
    }

    async fn balances(&self) -> Result<BalanceSnapshot, ReadError> {
        let native_balance = self
            .client
            .get_balance(self.wallet, None)
            .await
            .map_err(|e| ReadError::rpc("eth_getBalance", e))?;
        let token_balance = self
            .token
            .balance_of(self.wallet)
            .call()
            .await
            .map_err(|e| ReadError::rpc("balanceOf", e))?;
        Ok(BalanceSnapshot {
            native_balance,
            token_balance,
        })
    }
}

#[async_trait]
impl<M: Middleware + 'static> TradeVenue for EthersChain<M> {
    async fn buy_tokens(&self, native_in: U256) -> Result<TxReceipt, ExecutionErrorKind> {
        self.submit(self.buy_call(native_in), self.gas.swap_margin).await
    }

    async fn sell_tokens(&self, token_in: U256) -> Result<TxReceipt, ExecutionErrorKind> {
        self.submit(self.sell_call(token_in), self.gas.swap_margin).await
    }

    async fn router_allowance(&self) -> Result<U256, ExecutionErrorKind> {
        self.token
            .allowance(self.wallet, self.router_address)
            .call()
            .await
            .map_err(|e| ExecutionErrorKind::BalanceQuery(e.to_string()))
    }

    async fn approve_router(&self, amount: U256) -> Result<TxReceipt, ExecutionErrorKind> {
        self.submit(self.approve_call(amount), self.gas.approve_margin).await
    }

    async fn token_balance(&self) -> Result<U256, ExecutionErrorKind> {
        self.token
            .balance_of(self.wallet)
            .call()
            .await
            .map_err(|e| ExecutionErrorKind::BalanceQuery(e.to_string()))
    }
}
