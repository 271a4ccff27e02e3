//! Configuration loader and application settings.

use crate::errors::{AppError, Result};
use ethers::types::Address;
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ROUTER: &str = "0x10ED43C718714eb63d5aA57B78B54704E256024E";
pub const DEFAULT_FACTORY: &str = "0xca143ce32fe78f1f7019d7d551a6402fc5350c73";
pub const DEFAULT_WRAPPED_NATIVE: &str = "0xBB4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c";
pub const DEFAULT_STATE_FILE: &str = "tradeState.json";
pub const DEFAULT_STOP_FLAG: &str = "stop.flag";
pub const DEFAULT_INTERVAL_SECS: u64 = 10 * 60;

/// Consolidated application configuration.
#[derive(Debug)]
pub struct AppConfig {
    /// RPC endpoint for the chain node.
    pub rpc_url: Url,
    /// Signing key. Absent only in dry run.
    pub private_key: Option<SecretString>,
    /// Fallback wallet address when no key is configured.
    pub bot_address: Option<Address>,
    /// Tracked token.
    pub token: Address,
    pub profit_recipient: Option<Address>,
    pub router: Address,
    pub factory: Address,
    pub wrapped_native: Address,
    pub state_file: PathBuf,
    pub stop_flag: PathBuf,
    pub interval: Duration,
    pub dry_run: bool,
    pub gas: GasConfig,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| lookup(k))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let dry_run = get(&["DRY_RUN"]).is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let rpc_raw = get(&["RPC_URL", "BSC_RPC_URL"])
            .ok_or_else(|| AppError::Config("RPC_URL is required".into()))?;
        let rpc_url = Url::parse(&rpc_raw)
            .map_err(|e| AppError::Config(format!("RPC_URL is not a valid URL: {e}")))?;

        let private_key = get(&["PRIVATE_KEY"]).map(SecretString::from);
        if private_key.is_none() && !dry_run {
            return Err(AppError::Config(
                "PRIVATE_KEY is required unless DRY_RUN=true".into(),
            ));
        }

        let bot_address = get(&["BOT_ADDRESS"])
            .map(|v| parse_address("BOT_ADDRESS", &v))
            .transpose()?;
        if private_key.is_none() && bot_address.is_none() {
            return Err(AppError::Config(
                "BOT_ADDRESS is required when no PRIVATE_KEY is set".into(),
            ));
        }

        let token = get(&["TOKEN_ADDRESS", "BRICS_TOKEN"])
            .ok_or_else(|| AppError::Config("TOKEN_ADDRESS is required".into()))
            .and_then(|v| parse_address("TOKEN_ADDRESS", &v))?;
        let profit_recipient = get(&["PROFIT_RECIPIENT", "MAIN_WALLET"])
            .map(|v| parse_address("PROFIT_RECIPIENT", &v))
            .transpose()?;

        let address_or = |key: &'static str, default: &str| -> Result<Address> {
            parse_address(key, &get(&[key]).unwrap_or_else(|| default.to_string()))
        };
        let router = address_or("ROUTER_ADDRESS", DEFAULT_ROUTER)?;
        let factory = address_or("FACTORY_ADDRESS", DEFAULT_FACTORY)?;
        let wrapped_native = address_or("WRAPPED_NATIVE_ADDRESS", DEFAULT_WRAPPED_NATIVE)?;

        let interval_secs = match get(&["CYCLE_INTERVAL_SECS"]) {
            Some(v) => parse_number("CYCLE_INTERVAL_SECS", &v)?,
            None => DEFAULT_INTERVAL_SECS,
        };
        if interval_secs == 0 {
            return Err(AppError::Config("CYCLE_INTERVAL_SECS must be positive".into()));
        }

        Ok(Self {
            rpc_url,
            private_key,
            bot_address,
            token,
            profit_recipient,
            router,
            factory,
            wrapped_native,
            state_file: get(&["STATE_FILE"])
                .unwrap_or_else(|| DEFAULT_STATE_FILE.into())
                .into(),
            stop_flag: get(&["STOP_FLAG"])
                .unwrap_or_else(|| DEFAULT_STOP_FLAG.into())
                .into(),
            interval: Duration::from_secs(interval_secs),
            dry_run,
            gas: load_gas_config(&get)?,
        })
    }
}

/// Gas and deadline settings for on-chain submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasConfig {
    /// Gas units added on top of a swap estimate.
    pub swap_margin: u64,
    /// Gas units added on top of an approve estimate.
    pub approve_margin: u64,
    /// How far in the future the router deadline is set.
    pub deadline: Duration,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            swap_margin: 10_000,
            approve_margin: 5_000,
            deadline: Duration::from_secs(300),
        }
    }
}

fn load_gas_config<F>(get: &F) -> Result<GasConfig>
where
    F: Fn(&[&str]) -> Option<String>,
{
    let defaults = GasConfig::default();
    let read = |key: &str, fallback: u64| -> Result<u64> {
        get(&[key]).map_or(Ok(fallback), |v| parse_number(key, &v))
    };
    Ok(GasConfig {
        swap_margin: read("GAS_MARGIN_SWAP", defaults.swap_margin)?,
        approve_margin: read("GAS_MARGIN_APPROVE", defaults.approve_margin)?,
        deadline: Duration::from_secs(read("DEADLINE_SECS", defaults.deadline.as_secs())?),
    })
}

fn parse_address(key: &str, raw: &str) -> Result<Address> {
    raw.parse::<Address>()
        .map_err(|e| AppError::Config(format!("{key} is not a valid address: {e}")))
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|e| AppError::Config(format!("{key} must be a non-negative integer: {e}")))
}
