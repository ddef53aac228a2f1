//! Shared numeric and address conversion helpers.

pub mod conversions;

pub use conversions::{decimal_to_u256, u256_to_decimal, ConversionError};
