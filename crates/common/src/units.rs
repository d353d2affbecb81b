//! Ether unit formatting.
//!
//! Balances are carried as raw wei (`U256`) everywhere; scaling to ether
//! happens only at display time and never touches the raw value.

use alloy_primitives::utils::format_units;
use alloy_primitives::U256;

/// Formats a wei amount as ether.
///
/// Trailing fractional zeros are dropped but at least one fractional digit
/// is kept: `2500000000000000000 → "2.5"`, `10^18 → "1.0"`, `0 → "0.0"`.
pub fn format_ether(wei: U256) -> String {
    let Ok(full) = format_units(wei, "ether") else {
        return wei.to_string();
    };
    let trimmed = full.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(v: u128) -> U256 {
        U256::from(v)
    }

    const ETHER: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn two_and_a_half_ether() {
        assert_eq!(format_ether(wei(2_500_000_000_000_000_000)), "2.5");
    }

    #[test]
    fn whole_and_zero_amounts_keep_one_decimal() {
        assert_eq!(format_ether(U256::ZERO), "0.0");
        assert_eq!(format_ether(wei(ETHER)), "1.0");
        assert_eq!(format_ether(wei(42 * ETHER)), "42.0");
        assert_eq!(format_ether(wei(100 * ETHER)), "100.0");
    }

    #[test]
    fn one_wei() {
        assert_eq!(format_ether(wei(1)), "0.000000000000000001");
    }

    #[test]
    fn sub_ether_amount() {
        assert_eq!(format_ether(wei(100_000_000_000_000_000)), "0.1");
        assert_eq!(format_ether(wei(123_450_000_000_000_000)), "0.12345");
    }

    #[test]
    fn values_beyond_u128_are_formatted() {
        let s = format_ether(U256::from(u128::MAX) * U256::from(10u8));
        assert!(s.starts_with("3402823669209384634633."), "{}", s);
    }
}
