//! # Router Module
//!
//! Routing primitives shared by the route finder, quote engine and swap
//! executor: protocol identifiers, router call families, and helpers over a
//! route expressed as an ordered list of token addresses.

use ethers::abi::Abi;
use ethers::prelude::Address;
use serde::{Deserialize, Serialize};

use crate::contracts::{KALYSWAP_ROUTER_ABI, UNISWAP_V2_ROUTER_ABI};

pub mod finder;

pub use finder::{FoundRoute, RouteFinder};

/// A route of length 2 is a direct swap, length 3 goes through one
/// intermediate asset. Deeper paths are never produced.
pub const MAX_ROUTE_LEN: usize = 3;

/// DEX protocol identifier. One per supported chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DexId {
    KalySwap,
    PancakeSwap,
    UniswapV2,
}

impl DexId {
    pub fn name(&self) -> &'static str {
        match self {
            DexId::KalySwap => "KalySwap",
            DexId::PancakeSwap => "PancakeSwap",
            DexId::UniswapV2 => "UniswapV2",
        }
    }

    /// Router ABI family used to encode swap calls.
    pub fn router_abi(&self) -> &'static Abi {
        match self {
            DexId::KalySwap => &KALYSWAP_ROUTER_ABI,
            DexId::PancakeSwap | DexId::UniswapV2 => &UNISWAP_V2_ROUTER_ABI,
        }
    }

    /// Router function for an exact native-coin input.
    pub fn native_in_function(&self) -> &'static str {
        match self {
            DexId::KalySwap => "swapExactKLCForTokens",
            DexId::PancakeSwap | DexId::UniswapV2 => "swapExactETHForTokens",
        }
    }

    /// Router function for an exact token input paid out in the native coin.
    pub fn native_out_function(&self) -> &'static str {
        match self {
            DexId::KalySwap => "swapExactTokensForKLC",
            DexId::PancakeSwap | DexId::UniswapV2 => "swapExactTokensForETH",
        }
    }

    pub fn token_to_token_function(&self) -> &'static str {
        "swapExactTokensForTokens"
    }
}

impl std::fmt::Display for DexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Adjacent (token_in, token_out) pairs along a route.
pub fn hops(route: &[Address]) -> impl Iterator<Item = (Address, Address)> + '_ {
    route.windows(2).map(|w| (w[0], w[1]))
}

/// A usable route has one or two hops and never revisits a token.
pub fn is_well_formed(route: &[Address]) -> bool {
    if route.len() < 2 || route.len() > MAX_ROUTE_LEN {
        return false;
    }
    route
        .iter()
        .enumerate()
        .all(|(i, a)| route[i + 1..].iter().all(|b| a != b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hops_of_two_hop_route() {
        let (a, b, c) = (
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
        );
        let route = vec![a, b, c];
        let collected: Vec<_> = hops(&route).collect();
        assert_eq!(collected, vec![(a, b), (b, c)]);
        assert_eq!(hops(&[]).count(), 0);
    }

    #[test]
    fn test_route_shape() {
        let (a, b, c, d) = (
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
            Address::repeat_byte(4),
        );
        assert!(is_well_formed(&[a, b]));
        assert!(is_well_formed(&[a, b, c]));
        assert!(!is_well_formed(&[a]));
        assert!(!is_well_formed(&[a, b, c, d]));
        assert!(!is_well_formed(&[a, b, a]));
    }

    #[test]
    fn test_router_families() {
        assert_eq!(DexId::KalySwap.native_in_function(), "swapExactKLCForTokens");
        assert_eq!(DexId::PancakeSwap.native_out_function(), "swapExactTokensForETH");
        for dex in [DexId::KalySwap, DexId::PancakeSwap, DexId::UniswapV2] {
            let abi = dex.router_abi();
            assert!(abi.function(dex.native_in_function()).is_ok());
            assert!(abi.function(dex.native_out_function()).is_ok());
            assert!(abi.function(dex.token_to_token_function()).is_ok());
        }
    }
}
