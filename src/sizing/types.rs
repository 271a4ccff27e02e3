use ethers::types::U256;

/// 10^15 wei, i.e. 0.001 native units.
const MILLI: u64 = 1_000_000_000_000_000;

/// Thresholds for the sizing engine. Native amounts are in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingConfig {
    /// Below this native balance the cycle does nothing.
    pub gas_floor: U256,
    /// Fixed size of the buy answering an external sale.
    pub compensating_buy: U256,
    /// The compensating buy is only planned while the balance exceeds this.
    pub compensation_min_balance: U256,
    /// Share of the native balance used for the dynamic buy, in basis points.
    pub buy_share_bps: u64,
    /// Upper bound on the unboosted dynamic buy.
    pub buy_cap: U256,
    /// Reserve change (per mille) above which the buy is boosted.
    pub boost_threshold_permille: u64,
    /// Boost factor as numerator / denominator.
    pub boost_num: u64,
    pub boost_den: u64,
    /// Native amount always left unspent for gas.
    pub gas_reserve: U256,
    /// Dynamic buys at or below this are skipped.
    pub dust: U256,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            gas_floor: U256::from(2 * MILLI),
            compensating_buy: U256::from(MILLI / 2),
            compensation_min_balance: U256::from(MILLI),
            buy_share_bps: 500,
            buy_cap: U256::from(2 * MILLI),
            boost_threshold_permille: 50,
            boost_num: 3,
            boost_den: 2,
            gas_reserve: U256::from(MILLI),
            dust: U256::from(MILLI / 10),
        }
    }
}
