//! # Constant-Product Math
//!
//! Integer swap math as executed by V2-style router contracts, plus the
//! decimal price-impact and slippage helpers built on top of it.
//!
//! All raw amounts are token base units (`U256`). Reserves are always
//! oriented as (reserve of the input token, reserve of the output token).

use ethers::types::U256;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::chains::FeeRate;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmmMathError {
    #[error("empty reserve")]
    EmptyReserve,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("invalid fee {numerator}/{denominator}")]
    InvalidFee { numerator: u32, denominator: u32 },
}

/// Output of an exact-input swap against one pool:
///
/// `out = in * (den - num) * rOut / (rIn * den + in * (den - num))`
///
/// A zero input yields zero output; an empty reserve is an error.
pub fn get_amount_out(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
    fee: FeeRate,
) -> Result<U256, AmmMathError> {
    if fee.denominator == 0 || fee.numerator >= fee.denominator {
        return Err(AmmMathError::InvalidFee {
            numerator: fee.numerator,
            denominator: fee.denominator,
        });
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(AmmMathError::EmptyReserve);
    }
    if amount_in.is_zero() {
        return Ok(U256::zero());
    }

    let amount_in_with_fee = amount_in
        .checked_mul(U256::from(fee.input_multiplier()))
        .ok_or(AmmMathError::Overflow)?;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out)
        .ok_or(AmmMathError::Overflow)?;
    let denominator = reserve_in
        .checked_mul(U256::from(fee.denominator))
        .and_then(|d| d.checked_add(amount_in_with_fee))
        .ok_or(AmmMathError::Overflow)?;
    Ok(numerator / denominator)
}

/// Amount of token B matching `amount_a` at the pool's current ratio
/// (the router's `quote` used when adding liquidity).
pub fn quote_liquidity(amount_a: U256, reserve_a: U256, reserve_b: U256) -> Result<U256, AmmMathError> {
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return Err(AmmMathError::EmptyReserve);
    }
    amount_a
        .checked_mul(reserve_b)
        .map(|n| n / reserve_a)
        .ok_or(AmmMathError::Overflow)
}

/// Percentage by which the execution price falls short of the spot price.
/// Never negative; zero when either price is zero.
pub fn price_impact_pct(spot_price: Decimal, execution_price: Decimal) -> Decimal {
    if spot_price.is_zero() || execution_price.is_zero() {
        return Decimal::ZERO;
    }
    let impact = (Decimal::ONE - execution_price / spot_price) * Decimal::ONE_HUNDRED;
    impact.max(Decimal::ZERO)
}

/// `amount * (1 - slippage_pct / 100)`.
pub fn apply_slippage(amount: Decimal, slippage_pct: Decimal) -> Decimal {
    let kept = Decimal::ONE - slippage_pct / Decimal::ONE_HUNDRED;
    (amount * kept).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const FEE_30: FeeRate = FeeRate::new(30, 10_000);

    fn units(whole: u64, decimals: usize) -> U256 {
        U256::from(whole) * U256::exp10(decimals)
    }

    #[test]
    fn test_amount_out_matches_formula() {
        // 1,000,000 KLC / 300 USDT, swap 1000 KLC
        let out = get_amount_out(units(1000, 18), units(1_000_000, 18), units(300, 6), FEE_30).unwrap();
        // 1000 * 0.997 * 300 / (1_000_000 + 997) = 0.2988020...
        assert_eq!(out, U256::from(298_802u64));
    }

    #[test]
    fn test_amount_out_zero_input() {
        let out = get_amount_out(U256::zero(), units(10, 18), units(10, 18), FEE_30).unwrap();
        assert!(out.is_zero());
    }

    #[test]
    fn test_amount_out_empty_reserve() {
        assert_eq!(
            get_amount_out(units(1, 18), U256::zero(), units(10, 18), FEE_30),
            Err(AmmMathError::EmptyReserve)
        );
        assert_eq!(
            get_amount_out(units(1, 18), units(10, 18), U256::zero(), FEE_30),
            Err(AmmMathError::EmptyReserve)
        );
    }

    #[test]
    fn test_amount_out_never_drains_pool() {
        let reserve_out = units(50, 18);
        let out = get_amount_out(units(1_000_000_000, 18), units(1, 18), reserve_out, FEE_30).unwrap();
        assert!(out < reserve_out);
    }

    #[test]
    fn test_lower_fee_pays_more() {
        let r = units(1_000, 18);
        let uni = get_amount_out(units(1, 18), r, r, FEE_30).unwrap();
        let cake = get_amount_out(units(1, 18), r, r, FeeRate::new(25, 10_000)).unwrap();
        assert!(cake > uni);
    }

    #[test]
    fn test_invalid_fee() {
        let r = units(1, 18);
        assert!(matches!(
            get_amount_out(r, r, r, FeeRate::new(10, 10)),
            Err(AmmMathError::InvalidFee { .. })
        ));
    }

    #[test]
    fn test_overflow_is_reported() {
        let huge = U256::MAX / 2;
        assert_eq!(get_amount_out(huge, huge, huge, FEE_30), Err(AmmMathError::Overflow));
    }

    #[test]
    fn test_quote_liquidity() {
        let out = quote_liquidity(units(2, 18), units(100, 18), units(50, 6)).unwrap();
        assert_eq!(out, units(1, 6));
        assert_eq!(quote_liquidity(units(1, 18), U256::zero(), units(1, 18)), Err(AmmMathError::EmptyReserve));
    }

    #[test]
    fn test_price_impact() {
        let spot = Decimal::from(2);
        let exec = Decimal::from_str("1.8").unwrap();
        assert_eq!(price_impact_pct(spot, exec), Decimal::from(10));
        assert_eq!(price_impact_pct(spot, Decimal::from(3)), Decimal::ZERO);
        assert_eq!(price_impact_pct(Decimal::ZERO, exec), Decimal::ZERO);
    }

    #[test]
    fn test_apply_slippage() {
        let min = apply_slippage(Decimal::from(1000), Decimal::from_str("0.5").unwrap());
        assert_eq!(min, Decimal::from(995));
        assert_eq!(apply_slippage(Decimal::from(10), Decimal::from(150)), Decimal::ZERO);
    }
}
