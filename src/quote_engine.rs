//! # Quote Engine
//!
//! Evaluates a route against live reserves. Every hop's pool is snapshotted
//! concurrently, then the constant-product formula is applied hop by hop on
//! raw integers, each hop's output feeding the next hop's input.
//!
//! Price impact compares the execution price (`amount_out / amount_in`) with
//! the composed spot price, the product of each hop's `reserve_out /
//! reserve_in` in decimal-adjusted units.

use ethers::types::{Address, U256};
use futures::future::try_join_all;
use log::debug;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{DexError, DexResult};
use crate::metrics;
use crate::pair_resolver::{OrientedReserves, PairInfo, PairResolver};
use crate::router::{hops, is_well_formed, RouteFinder};
use crate::types::conversions::{decimal_to_u256, u256_to_decimal};
use crate::v2_math::{self, AmmMathError};

/// One hop of a quote, in raw token units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HopQuote {
    pub pair: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in_raw: U256,
    pub amount_out_raw: U256,
    pub reserve_in: U256,
    pub reserve_out: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub amount_in: Decimal,
    pub amount_in_raw: U256,
    pub amount_out: Decimal,
    pub amount_out_raw: U256,
    pub price_impact_pct: Decimal,
    pub route: Vec<Address>,
    pub hops: Vec<HopQuote>,
}

#[derive(Clone)]
pub struct QuoteEngine {
    finder: RouteFinder,
}

impl QuoteEngine {
    pub fn new(finder: RouteFinder) -> Self {
        Self { finder }
    }

    fn resolver(&self) -> &PairResolver {
        self.finder.resolver()
    }

    fn protocol(&self) -> &'static str {
        self.resolver().protocol()
    }

    /// Routes `token_in -> token_out` and quotes `amount_in` (decimal units
    /// of the input token) along the route found.
    pub async fn get_quote(&self, token_in: Address, token_out: Address, amount_in: Decimal) -> DexResult<Quote> {
        if amount_in.is_sign_negative() && !amount_in.is_zero() {
            return Err(DexError::invalid(self.protocol(), format!("negative amount {}", amount_in)));
        }
        let found = self.finder.find_route(token_in, token_out).await?;
        if found.is_empty() {
            return Err(DexError::NoRoute {
                protocol: self.protocol(),
                token_in,
                token_out,
            });
        }
        // pools are already known, only their state is read
        let resolver = self.resolver();
        let pairs = try_join_all(
            hops(&found.tokens)
                .zip(found.pairs.iter())
                .map(|((a, b), pair)| resolver.read_pair(*pair, a, b)),
        )
        .await?;
        self.evaluate(&found.tokens, &pairs, amount_in)
    }

    /// Quotes `amount_in` along an explicit route.
    pub async fn quote_route(&self, route: &[Address], amount_in: Decimal) -> DexResult<Quote> {
        let protocol = self.protocol();
        if !is_well_formed(route) {
            return Err(DexError::invalid(protocol, format!("malformed route of {} tokens", route.len())));
        }
        let pairs = try_join_all(hops(route).map(|(a, b)| self.resolver().get_pair_info(a, b))).await?;
        self.evaluate(route, &pairs, amount_in)
    }

    fn evaluate(&self, route: &[Address], pairs: &[PairInfo], amount_in: Decimal) -> DexResult<Quote> {
        let protocol = self.protocol();

        let mut legs: Vec<(Address, Address, &PairInfo, OrientedReserves)> = Vec::with_capacity(pairs.len());
        for ((token_in, token_out), info) in hops(route).zip(pairs.iter()) {
            if !info.exists {
                return Err(DexError::PairNotFound {
                    protocol,
                    token_a: token_in,
                    token_b: token_out,
                });
            }
            if !info.has_liquidity() {
                return Err(DexError::InsufficientLiquidity {
                    protocol,
                    pair: info.address,
                });
            }
            let oriented = info.oriented(token_in).ok_or_else(|| DexError::QueryFailed {
                protocol,
                operation: "pair state",
                message: format!("pair {:?} does not hold {:?}", info.address, token_in),
            })?;
            legs.push((token_in, token_out, info, oriented));
        }

        let decimals_in = legs[0].3.decimals_in;
        let decimals_out = legs[legs.len() - 1].3.decimals_out;
        let amount_in_raw = decimal_to_u256(amount_in, decimals_in)
            .map_err(|e| DexError::invalid(protocol, e.to_string()))?;

        let fee = self.resolver().config().fee;
        let mut hop_quotes = Vec::with_capacity(legs.len());
        let mut running = amount_in_raw;
        let mut spot = Decimal::ONE;
        for (token_in, token_out, info, reserves) in &legs {
            let out = v2_math::get_amount_out(running, reserves.reserve_in, reserves.reserve_out, fee)
                .map_err(|e| self.math_error(info.address, e))?;
            hop_quotes.push(HopQuote {
                pair: info.address,
                token_in: *token_in,
                token_out: *token_out,
                amount_in_raw: running,
                amount_out_raw: out,
                reserve_in: reserves.reserve_in,
                reserve_out: reserves.reserve_out,
            });
            spot = spot_price(reserves)
                .and_then(|hop_spot| spot.checked_mul(hop_spot))
                .ok_or_else(|| DexError::invalid(protocol, "spot price out of range"))?;
            running = out;
        }

        let amount_in = self.scale(amount_in_raw, decimals_in)?;
        let amount_out = self.scale(running, decimals_out)?;
        let execution = amount_out.checked_div(amount_in).unwrap_or(Decimal::ZERO);
        let price_impact_pct = v2_math::price_impact_pct(spot, execution);

        debug!(
            "{}: quote {} -> {} over {} hop(s), impact {}%",
            protocol,
            amount_in,
            amount_out,
            hop_quotes.len(),
            price_impact_pct
        );
        metrics::record_quote(protocol, hop_quotes.len());

        Ok(Quote {
            amount_in,
            amount_in_raw,
            amount_out,
            amount_out_raw: running,
            price_impact_pct,
            route: route.to_vec(),
            hops: hop_quotes,
        })
    }

    /// Price impact in percent of swapping `amount_in` along the best route.
    pub async fn calculate_price_impact(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: Decimal,
    ) -> DexResult<Decimal> {
        Ok(self.get_quote(token_in, token_out, amount_in).await?.price_impact_pct)
    }

    fn scale(&self, raw: U256, decimals: u8) -> DexResult<Decimal> {
        u256_to_decimal(raw, decimals).map_err(|e| DexError::invalid(self.protocol(), e.to_string()))
    }

    fn math_error(&self, pair: Address, err: AmmMathError) -> DexError {
        match err {
            AmmMathError::EmptyReserve => DexError::InsufficientLiquidity {
                protocol: self.protocol(),
                pair,
            },
            other => DexError::invalid(self.protocol(), other.to_string()),
        }
    }
}

/// `reserve_out / reserve_in` in decimal-adjusted units.
fn spot_price(reserves: &OrientedReserves) -> Option<Decimal> {
    let reserve_in = u256_to_decimal(reserves.reserve_in, reserves.decimals_in).ok()?;
    let reserve_out = u256_to_decimal(reserves.reserve_out, reserves.decimals_out).ok()?;
    reserve_out.checked_div(reserve_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::{self, KALYCHAIN};
    use crate::error::ErrorKind;
    use crate::mocks::InMemoryChainReader;
    use crate::tokens::{find_token_by_symbol, NATIVE_ADDRESS};
    use std::str::FromStr;
    use std::sync::Arc;

    fn sym(symbol: &str) -> Address {
        find_token_by_symbol(symbol, KALYCHAIN).unwrap().address
    }

    fn units(whole: u64, decimals: usize) -> U256 {
        U256::from(whole) * U256::exp10(decimals)
    }

    fn engine(reader: InMemoryChainReader) -> QuoteEngine {
        let config = Arc::new(chains::get_config(KALYCHAIN).unwrap().clone());
        let resolver = PairResolver::new(config, Arc::new(reader.with_registry_decimals(KALYCHAIN)));
        QuoteEngine::new(RouteFinder::new(resolver))
    }

    fn klc_usdt() -> InMemoryChainReader {
        InMemoryChainReader::new().with_pair(
            Address::repeat_byte(0x11),
            (sym("wKLC"), units(1_000_000, 18)),
            (sym("USDT"), units(300, 6)),
        )
    }

    #[tokio::test]
    async fn test_klc_to_usdt_scenario() {
        let quote = engine(klc_usdt())
            .get_quote(NATIVE_ADDRESS, sym("USDT"), Decimal::from(1000))
            .await
            .unwrap();
        assert_eq!(quote.amount_out_raw, U256::from(298_802u64));
        assert_eq!(quote.amount_out, Decimal::from_str("0.298802").unwrap());
        assert_eq!(quote.route, vec![sym("wKLC"), sym("USDT")]);
        assert_eq!(quote.hops.len(), 1);
        // 0.3% fee plus ~0.1% curve slippage
        assert!(quote.price_impact_pct > Decimal::from_str("0.39").unwrap());
        assert!(quote.price_impact_pct < Decimal::from_str("0.41").unwrap());
    }

    #[tokio::test]
    async fn test_zero_amount_quotes_zero() {
        let quote = engine(klc_usdt())
            .get_quote(NATIVE_ADDRESS, sym("USDT"), Decimal::ZERO)
            .await
            .unwrap();
        assert!(quote.amount_out.is_zero());
        assert!(quote.price_impact_pct.is_zero());
    }

    #[tokio::test]
    async fn test_empty_reserve_is_insufficient_liquidity() {
        let reader = InMemoryChainReader::new().with_pair(
            Address::repeat_byte(0x12),
            (sym("wKLC"), units(10, 18)),
            (sym("DAI"), U256::zero()),
        );
        let err = engine(reader)
            .get_quote(sym("wKLC"), sym("DAI"), Decimal::ONE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientLiquidity);
    }

    #[tokio::test]
    async fn test_unroutable_is_no_route() {
        let err = engine(InMemoryChainReader::new())
            .get_quote(sym("DAI"), sym("KSWAP"), Decimal::ONE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoRoute);
        assert_eq!(err.protocol(), "KalySwap");
    }

    #[tokio::test]
    async fn test_two_hop_composes_outputs() {
        let reader = InMemoryChainReader::new()
            .with_pair(
                Address::repeat_byte(0x13),
                (sym("DAI"), units(1_000, 18)),
                (sym("wKLC"), units(2_000, 18)),
            )
            .with_pair(
                Address::repeat_byte(0x14),
                (sym("wKLC"), units(4_000, 18)),
                (sym("KSWAP"), units(1_000, 18)),
            );
        let quote = engine(reader)
            .get_quote(sym("DAI"), sym("KSWAP"), Decimal::ONE)
            .await
            .unwrap();
        assert_eq!(quote.route, vec![sym("DAI"), sym("wKLC"), sym("KSWAP")]);
        assert_eq!(quote.hops.len(), 2);
        assert_eq!(quote.hops[1].amount_in_raw, quote.hops[0].amount_out_raw);
        assert_eq!(quote.amount_out_raw, quote.hops[1].amount_out_raw);

        let first = v2_math::get_amount_out(units(1, 18), units(1_000, 18), units(2_000, 18), chains::get_config(KALYCHAIN).unwrap().fee).unwrap();
        assert_eq!(quote.hops[0].amount_out_raw, first);
        // composed spot is 2 * 0.25 = 0.5; two fees put impact above 0.6%
        assert!(quote.price_impact_pct > Decimal::from_str("0.6").unwrap());
        assert!(quote.amount_out < Decimal::from_str("0.5").unwrap());
    }

    #[tokio::test]
    async fn test_quote_reuses_pools_found_while_routing() {
        let reader = Arc::new(
            InMemoryChainReader::new()
                .with_pair(
                    Address::repeat_byte(0x13),
                    (sym("DAI"), units(1_000, 18)),
                    (sym("wKLC"), units(2_000, 18)),
                )
                .with_pair(
                    Address::repeat_byte(0x14),
                    (sym("wKLC"), units(4_000, 18)),
                    (sym("KSWAP"), units(1_000, 18)),
                )
                .with_registry_decimals(KALYCHAIN),
        );
        let config = Arc::new(chains::get_config(KALYCHAIN).unwrap().clone());
        let engine = QuoteEngine::new(RouteFinder::new(PairResolver::new(config, reader.clone())));

        let quote = engine.get_quote(sym("DAI"), sym("KSWAP"), Decimal::ONE).await.unwrap();
        assert_eq!(quote.hops[0].pair, Address::repeat_byte(0x13));
        assert_eq!(quote.hops[1].pair, Address::repeat_byte(0x14));
        // direct probe plus both wKLC legs; no lookups repeated for the quote
        assert_eq!(reader.get_pair_calls(), 3);
    }

    #[tokio::test]
    async fn test_negative_amount_is_invalid() {
        let err = engine(klc_usdt())
            .get_quote(NATIVE_ADDRESS, sym("USDT"), Decimal::from(-1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_quote_route_missing_hop_is_pair_not_found() {
        let err = engine(klc_usdt())
            .quote_route(&[sym("USDT"), sym("DAI")], Decimal::ONE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PairNotFound);
    }
}
