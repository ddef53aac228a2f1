//! # Route Finder
//!
//! Picks the swap path between two tokens on one chain, trying candidates
//! in a fixed precedence and returning the first that has liquidity pools
//! on every leg:
//!
//! 1. direct pair
//! 2. through the wrapped-native token
//! 3. through each configured bridge asset, in configured order
//!
//! The result is the ordered list of token addresses (native tokens already
//! replaced by their wrapped form), or an empty list when nothing connects.
//! Both legs of a two-hop candidate are probed concurrently.
//!
//! `find_route` also returns the pool addresses the factory reported for each
//! leg, so a quote over the found route does not repeat the lookups.

use ethers::types::Address;
use log::debug;

use crate::error::DexResult;
use crate::pair_resolver::PairResolver;

/// A route together with the pool serving each of its hops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoundRoute {
    pub tokens: Vec<Address>,
    /// `pairs[i]` connects `tokens[i]` and `tokens[i + 1]`.
    pub pairs: Vec<Address>,
}

impl FoundRoute {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Clone)]
pub struct RouteFinder {
    resolver: PairResolver,
}

impl RouteFinder {
    pub fn new(resolver: PairResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PairResolver {
        &self.resolver
    }

    /// Intermediate assets in the order they are tried after the direct
    /// pair: wrapped-native first, then the chain's bridge tokens. Assets
    /// equal to either endpoint are skipped.
    pub fn hub_candidates(&self, token_in: Address, token_out: Address) -> Vec<Address> {
        let config = self.resolver.config();
        let mut hubs = Vec::with_capacity(1 + config.bridge_tokens.len());
        if token_in != config.wrapped_native && token_out != config.wrapped_native {
            hubs.push(config.wrapped_native);
        }
        for bridge in &config.bridge_tokens {
            if *bridge != token_in && *bridge != token_out && !hubs.contains(bridge) {
                hubs.push(*bridge);
            }
        }
        hubs
    }

    pub async fn get_swap_route(&self, token_in: Address, token_out: Address) -> DexResult<Vec<Address>> {
        Ok(self.find_route(token_in, token_out).await?.tokens)
    }

    /// Route plus the pool of each hop. Empty when nothing connects.
    pub async fn find_route(&self, token_in: Address, token_out: Address) -> DexResult<FoundRoute> {
        let protocol = self.resolver.protocol();
        let a = self.resolver.resolve(token_in);
        let b = self.resolver.resolve(token_out);
        if a == b {
            debug!("{}: {:?} -> {:?} resolves to the same token, no route", protocol, token_in, token_out);
            return Ok(FoundRoute::default());
        }

        if let Some(pair) = self.resolver.pair_address(a, b).await? {
            debug!("{}: direct route {:?} -> {:?}", protocol, a, b);
            return Ok(FoundRoute {
                tokens: vec![a, b],
                pairs: vec![pair],
            });
        }

        for hub in self.hub_candidates(a, b) {
            let legs = futures::try_join!(self.resolver.pair_address(a, hub), self.resolver.pair_address(hub, b))?;
            if let (Some(first), Some(second)) = legs {
                debug!("{}: route {:?} -> {:?} -> {:?}", protocol, a, hub, b);
                return Ok(FoundRoute {
                    tokens: vec![a, hub, b],
                    pairs: vec![first, second],
                });
            }
        }

        debug!("{}: no route {:?} -> {:?}", protocol, a, b);
        Ok(FoundRoute::default())
    }

    /// Whether a single pool connects the two tokens.
    pub async fn can_swap_directly(&self, token_in: Address, token_out: Address) -> DexResult<bool> {
        let a = self.resolver.resolve(token_in);
        let b = self.resolver.resolve(token_out);
        if a == b {
            return Ok(false);
        }
        self.resolver.pair_exists(a, b).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::{self, ProtocolConfig, BSC};
    use crate::error::ErrorKind;
    use crate::mocks::InMemoryChainReader;
    use crate::tokens::{find_token_by_symbol, NATIVE_ADDRESS};
    use ethers::types::U256;
    use std::sync::Arc;

    fn config() -> Arc<ProtocolConfig> {
        Arc::new(chains::get_config(BSC).unwrap().clone())
    }

    fn sym(symbol: &str) -> Address {
        find_token_by_symbol(symbol, BSC).unwrap().address
    }

    fn liquid() -> U256 {
        U256::exp10(24)
    }

    fn finder(reader: InMemoryChainReader) -> (RouteFinder, Arc<InMemoryChainReader>) {
        let reader = Arc::new(reader);
        let resolver = PairResolver::new(config(), reader.clone());
        (RouteFinder::new(resolver), reader)
    }

    fn pool(reader: InMemoryChainReader, n: u8, a: &str, b: &str) -> InMemoryChainReader {
        reader.with_pair(Address::repeat_byte(n), (sym(a), liquid()), (sym(b), liquid()))
    }

    #[tokio::test]
    async fn test_direct_pair_wins_over_hubs() {
        let reader = InMemoryChainReader::new();
        let reader = pool(reader, 1, "CAKE", "ETH");
        let reader = pool(reader, 2, "CAKE", "WBNB");
        let reader = pool(reader, 3, "WBNB", "ETH");
        let (finder, _) = finder(reader);
        let route = finder.get_swap_route(sym("CAKE"), sym("ETH")).await.unwrap();
        assert_eq!(route, vec![sym("CAKE"), sym("ETH")]);
    }

    #[tokio::test]
    async fn test_wrapped_native_hub_before_stablecoins() {
        let reader = InMemoryChainReader::new();
        let reader = pool(reader, 2, "CAKE", "WBNB");
        let reader = pool(reader, 3, "WBNB", "ETH");
        let reader = pool(reader, 4, "CAKE", "USDT");
        let reader = pool(reader, 5, "USDT", "ETH");
        let (finder, _) = finder(reader);
        let route = finder.get_swap_route(sym("CAKE"), sym("ETH")).await.unwrap();
        assert_eq!(route, vec![sym("CAKE"), sym("WBNB"), sym("ETH")]);
    }

    #[tokio::test]
    async fn test_bridge_tokens_follow_configured_order() {
        let reader = InMemoryChainReader::new();
        let reader = pool(reader, 4, "CAKE", "USDT");
        let reader = pool(reader, 5, "USDT", "ETH");
        let reader = pool(reader, 6, "CAKE", "BUSD");
        let reader = pool(reader, 7, "BUSD", "ETH");
        let (finder, _) = finder(reader);
        let route = finder.get_swap_route(sym("CAKE"), sym("ETH")).await.unwrap();
        assert_eq!(route, vec![sym("CAKE"), sym("USDT"), sym("ETH")]);
    }

    #[tokio::test]
    async fn test_second_bridge_used_when_first_has_one_leg() {
        let reader = InMemoryChainReader::new();
        let reader = pool(reader, 4, "CAKE", "USDT");
        let reader = pool(reader, 6, "CAKE", "BUSD");
        let reader = pool(reader, 7, "BUSD", "ETH");
        let (finder, _) = finder(reader);
        let route = finder.get_swap_route(sym("CAKE"), sym("ETH")).await.unwrap();
        assert_eq!(route, vec![sym("CAKE"), sym("BUSD"), sym("ETH")]);
    }

    #[tokio::test]
    async fn test_found_route_carries_leg_pools() {
        let reader = InMemoryChainReader::new();
        let reader = pool(reader, 6, "CAKE", "BUSD");
        let reader = pool(reader, 7, "BUSD", "ETH");
        let (finder, _) = finder(reader);
        let found = finder.find_route(sym("CAKE"), sym("ETH")).await.unwrap();
        assert_eq!(found.tokens, vec![sym("CAKE"), sym("BUSD"), sym("ETH")]);
        assert_eq!(found.pairs, vec![Address::repeat_byte(6), Address::repeat_byte(7)]);
    }

    #[tokio::test]
    async fn test_native_input_routes_through_wrapped_address() {
        let reader = pool(InMemoryChainReader::new(), 8, "WBNB", "CAKE");
        let (finder, _) = finder(reader);
        let route = finder.get_swap_route(NATIVE_ADDRESS, sym("CAKE")).await.unwrap();
        assert_eq!(route, vec![sym("WBNB"), sym("CAKE")]);
    }

    #[tokio::test]
    async fn test_hub_equal_to_endpoint_is_skipped() {
        let f = finder(InMemoryChainReader::new()).0;
        let hubs = f.hub_candidates(sym("USDT"), sym("CAKE"));
        assert_eq!(hubs, vec![sym("WBNB"), sym("BUSD")]);
        let hubs = f.hub_candidates(sym("WBNB"), sym("BUSD"));
        assert_eq!(hubs, vec![sym("USDT")]);
    }

    #[tokio::test]
    async fn test_unroutable_pair_returns_empty() {
        let (finder, reader) = finder(InMemoryChainReader::new());
        let route = finder.get_swap_route(sym("CAKE"), sym("ETH")).await.unwrap();
        assert!(route.is_empty());
        // direct + (WBNB, USDT, BUSD) x 2 legs
        assert_eq!(reader.get_pair_calls(), 7);
    }

    #[tokio::test]
    async fn test_same_token_is_unroutable() {
        let (finder, reader) = finder(InMemoryChainReader::new());
        let route = finder.get_swap_route(NATIVE_ADDRESS, sym("WBNB")).await.unwrap();
        assert!(route.is_empty());
        assert_eq!(reader.get_pair_calls(), 0);
    }

    #[tokio::test]
    async fn test_rpc_failure_is_not_an_empty_route() {
        let (finder, _) = finder(InMemoryChainReader::new().failing_factory());
        let err = finder.get_swap_route(sym("CAKE"), sym("ETH")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailed);
    }

    #[tokio::test]
    async fn test_can_swap_directly() {
        let reader = pool(InMemoryChainReader::new(), 9, "USDT", "BUSD");
        let (finder, _) = finder(reader);
        assert!(finder.can_swap_directly(sym("USDT"), sym("BUSD")).await.unwrap());
        assert!(!finder.can_swap_directly(sym("USDT"), sym("CAKE")).await.unwrap());
    }
}
