use crate::errors::ReadError;
use crate::models::PoolSnapshot;
use ethers::types::{Address, U256};

/// Assign pair reserves to (token, native) using the pair's asset order.
///
/// `Address` equality is byte-wise, so checksummed and lower-case inputs
/// compare equal. Both sides are asserted: one asset must be the tracked
/// token and the other the wrapped native asset, otherwise the reserves
/// would be silently swapped downstream.
pub fn order_reserves(
    token0: Address,
    token1: Address,
    reserve0: U256,
    reserve1: U256,
    token: Address,
    native: Address,
) -> Result<PoolSnapshot, ReadError> {
    if token0 == token && token1 == native {
        Ok(PoolSnapshot {
            reserve_token: reserve0,
            reserve_native: reserve1,
        })
    } else if token1 == token && token0 == native {
        Ok(PoolSnapshot {
            reserve_token: reserve1,
            reserve_native: reserve0,
        })
    } else {
        Err(ReadError::AssetMismatch {
            token0,
            token1,
            token,
            native,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    const TOKEN: &str = "0xaBcDef0000000000000000000000000000000001";
    const WBNB: &str = "0xBB4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c";

    #[test]
    fn token_first() {
        let snap = order_reserves(
            addr(TOKEN),
            addr(WBNB),
            U256::from(900u64),
            U256::from(11u64),
            addr(TOKEN),
            addr(WBNB),
        )
        .unwrap();
        assert_eq!(snap.reserve_token, U256::from(900u64));
        assert_eq!(snap.reserve_native, U256::from(11u64));
    }

    #[test]
    fn token_second() {
        let snap = order_reserves(
            addr(WBNB),
            addr(TOKEN),
            U256::from(11u64),
            U256::from(900u64),
            addr(TOKEN),
            addr(WBNB),
        )
        .unwrap();
        assert_eq!(snap.reserve_token, U256::from(900u64));
        assert_eq!(snap.reserve_native, U256::from(11u64));
    }

    #[test]
    fn address_case_does_not_matter() {
        let lower = addr(&TOKEN.to_lowercase());
        let upper = addr(&format!("0x{}", TOKEN[2..].to_uppercase()));
        let snap = order_reserves(
            lower,
            addr(WBNB),
            U256::from(1u64),
            U256::from(2u64),
            upper,
            addr(&WBNB.to_lowercase()),
        )
        .unwrap();
        assert_eq!(snap.reserve_token, U256::from(1u64));
    }

    #[test]
    fn unrelated_assets_are_rejected() {
        let other = addr("0x0000000000000000000000000000000000000042");
        let err = order_reserves(
            other,
            addr(WBNB),
            U256::one(),
            U256::one(),
            addr(TOKEN),
            addr(WBNB),
        )
        .unwrap_err();
        assert!(matches!(err, ReadError::AssetMismatch { .. }));

        // Token present but paired with something other than the native asset.
        let err = order_reserves(
            addr(TOKEN),
            other,
            U256::one(),
            U256::one(),
            addr(TOKEN),
            addr(WBNB),
        )
        .unwrap_err();
        assert!(matches!(err, ReadError::AssetMismatch { .. }));
    }
}
