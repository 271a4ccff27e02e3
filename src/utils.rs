//! Miscellaneous helper utilities.

use ethers::types::U256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Unix timestamp `offset` from now, as the router expects it.
pub fn deadline_after(offset: Duration) -> U256 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    U256::from((now + offset).as_secs())
}

/// Human-readable 18-decimal amount for log lines only.
pub fn display_units(amount: U256) -> String {
    ethers::utils::format_ether(amount)
}
