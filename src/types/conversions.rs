use ethers::types::{Address, U256};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

// 2^96: one past the largest mantissa a Decimal can hold
const DECIMAL_MANTISSA_LIMIT: u128 = 1u128 << 96;
const MAX_DECIMAL_SCALE: u32 = 28;

/// Raw on-chain integer to a decimal-adjusted quantity.
///
/// Exact while the raw value fits a `Decimal` mantissa; larger values lose
/// their least significant digits, never their magnitude.
pub fn u256_to_decimal(value: U256, decimals: u8) -> Result<Decimal, ConversionError> {
    let mut mantissa = value;
    let mut dropped: u32 = 0;
    while mantissa >= U256::from(DECIMAL_MANTISSA_LIMIT) {
        mantissa /= 10;
        dropped += 1;
    }
    let mantissa = mantissa.as_u128() as i128;
    let decimals = decimals as u32;

    if dropped > decimals {
        let mut result = Decimal::from_i128_with_scale(mantissa, 0);
        for _ in 0..(dropped - decimals) {
            result = result
                .checked_mul(Decimal::TEN)
                .ok_or(ConversionError::Overflow)?;
        }
        return Ok(result);
    }

    let scale = decimals - dropped;
    if scale <= MAX_DECIMAL_SCALE {
        return Ok(Decimal::from_i128_with_scale(mantissa, scale));
    }
    let mut result = Decimal::from_i128_with_scale(mantissa, MAX_DECIMAL_SCALE);
    for _ in 0..(scale - MAX_DECIMAL_SCALE) {
        result /= Decimal::TEN;
    }
    Ok(result)
}

/// Decimal-adjusted quantity to a raw on-chain integer, truncating toward
/// zero at `decimals` places.
pub fn decimal_to_u256(value: Decimal, decimals: u8) -> Result<U256, ConversionError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ConversionError::Negative(value.to_string()));
    }
    let truncated = value.round_dp_with_strategy(decimals as u32, RoundingStrategy::ToZero);
    let mantissa = truncated.mantissa();
    let scale = truncated.scale();
    let raw = U256::from(mantissa.unsigned_abs());
    let factor = U256::exp10((decimals as u32).saturating_sub(scale) as usize);
    raw.checked_mul(factor).ok_or(ConversionError::Overflow)
}

pub fn address_to_string(addr: Address) -> String {
    format!("{:?}", addr).to_lowercase()
}

pub fn string_to_address(s: &str) -> Result<Address, ConversionError> {
    Address::from_str(s.trim()).map_err(|e| ConversionError::InvalidAddress(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),
    #[error("Negative amount: {0}")]
    Negative(String),
    #[error("Overflow in conversion")]
    Overflow,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

pub fn parse_decimal(s: &str) -> Result<Decimal, ConversionError> {
    Decimal::from_str(s.trim()).map_err(|e| ConversionError::InvalidDecimal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_to_decimal_exact() {
        let raw = U256::from(1_500_000u64);
        assert_eq!(u256_to_decimal(raw, 6).unwrap(), Decimal::from_str("1.5").unwrap());

        let one_ether = U256::exp10(18);
        assert_eq!(u256_to_decimal(one_ether, 18).unwrap(), Decimal::ONE);
        assert_eq!(u256_to_decimal(U256::zero(), 18).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_u256_to_decimal_large_values_keep_magnitude() {
        // 10^30 wei = 10^12 tokens
        let raw = U256::exp10(30);
        let value = u256_to_decimal(raw, 18).unwrap();
        assert_eq!(value, Decimal::from(1_000_000_000_000u64));

        // reserves above the 96-bit mantissa, scaled down
        let raw = U256::from(123_456_789u64) * U256::exp10(25);
        let value = u256_to_decimal(raw, 18).unwrap();
        assert_eq!(value, Decimal::from_str("1234567890000000").unwrap());
    }

    #[test]
    fn test_decimal_to_u256_truncates() {
        let value = Decimal::from_str("0.2988029").unwrap();
        assert_eq!(decimal_to_u256(value, 6).unwrap(), U256::from(298_802u64));

        let value = Decimal::from_str("1000").unwrap();
        assert_eq!(decimal_to_u256(value, 18).unwrap(), U256::from(1000u64) * U256::exp10(18));
    }

    #[test]
    fn test_decimal_to_u256_rejects_negative() {
        let value = Decimal::from_str("-1").unwrap();
        assert!(matches!(decimal_to_u256(value, 18), Err(ConversionError::Negative(_))));
    }

    #[test]
    fn test_address_round_trip() {
        let addr = string_to_address("0xAF88D065E77C8CC2239327C5EDB3A432268E5831").unwrap();
        assert_eq!(address_to_string(addr), "0xaf88d065e77c8cc2239327c5edb3a432268e5831");
        assert!(string_to_address("0x1234").is_err());
    }
}
