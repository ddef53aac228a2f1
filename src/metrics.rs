// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{counter, describe_counter, increment_counter, Unit};

// NOTE: When observability feature is disabled, provide stub implementations
#[cfg(not(feature = "observability"))]
pub enum Unit {}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {{
        $(let _ = &$label_value;)*
    }};
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {{
        $(let _ = &$label_value;)*
    }};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! increment_counter {
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {{
        $(let _ = &$label_value;)*
    }};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, increment_counter};

use crate::error::ErrorKind;

/// Registers metric descriptions. Call once at startup.
pub fn describe_metrics() {
    describe_counter!(
        "dex_quotes_total",
        Unit::Count,
        "Quotes computed, labeled by protocol."
    );
    describe_counter!(
        "dex_operation_failures_total",
        Unit::Count,
        "Failed dispatcher operations, labeled by protocol and error kind."
    );
    describe_counter!(
        "dex_swaps_submitted_total",
        Unit::Count,
        "Swap transactions broadcast, labeled by protocol."
    );
    describe_counter!(
        "dex_rpc_failures_total",
        Unit::Count,
        "Failed chain reads, labeled by protocol and call."
    );
}

pub fn record_quote(protocol: &str, hops: usize) {
    increment_counter!("dex_quotes_total", "protocol" => protocol.to_string(), "hops" => hops.to_string());
}

pub fn record_failure(protocol: &str, kind: ErrorKind) {
    increment_counter!(
        "dex_operation_failures_total",
        "protocol" => protocol.to_string(),
        "kind" => kind.as_str()
    );
}

pub fn record_swap_submitted(protocol: &str) {
    counter!("dex_swaps_submitted_total", 1, "protocol" => protocol.to_string());
}

pub fn record_rpc_failure(protocol: &str, call: &str) {
    increment_counter!(
        "dex_rpc_failures_total",
        "protocol" => protocol.to_string(),
        "call" => call.to_string()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_run_without_recorder() {
        describe_metrics();
        record_quote("KalySwap", 2);
        record_failure("PancakeSwap", ErrorKind::NoRoute);
        record_swap_submitted("UniswapV2");
        record_rpc_failure("KalySwap", "getPair");
    }
}
