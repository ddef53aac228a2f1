//! Integration tests for quoting and swapping through the dispatcher
//!
//! Tests cover:
//! - Quotes over live-like reserves on each chain's fee
//! - Quote stability and round-trip loss
//! - Quote -> swap hand-off through a recording sender

use std::str::FromStr;
use std::sync::Arc;

use dex_router_sdk::chains::{get_config, BSC, KALYCHAIN};
use dex_router_sdk::dispatcher::AdapterRegistry;
use dex_router_sdk::mocks::{InMemoryChainReader, RecordingSender};
use dex_router_sdk::swap_executor::SwapParams;
use dex_router_sdk::tokens::{find_token_by_symbol, Token, NATIVE_ADDRESS};
use dex_router_sdk::ErrorKind;
use ethers::types::{Address, NameOrAddress, U256};
use rust_decimal::Decimal;

fn tok(symbol: &str, chain: u64) -> Token {
    find_token_by_symbol(symbol, chain).unwrap().clone()
}

fn units(whole: u64, decimals: usize) -> U256 {
    U256::from(whole) * U256::exp10(decimals)
}

fn kaly_registry() -> AdapterRegistry {
    let reader = InMemoryChainReader::new()
        .with_pair(
            Address::repeat_byte(0x11),
            (tok("wKLC", KALYCHAIN).address, units(1_000_000, 18)),
            (tok("USDT", KALYCHAIN).address, units(300, 6)),
        )
        .with_registry_decimals(KALYCHAIN);
    AdapterRegistry::new().with_reader(KALYCHAIN, Arc::new(reader))
}

fn bsc_registry() -> AdapterRegistry {
    let deep = units(1_000_000, 18);
    let reader = InMemoryChainReader::new()
        .with_pair(
            Address::repeat_byte(0x21),
            (tok("CAKE", BSC).address, deep),
            (tok("WBNB", BSC).address, deep),
        )
        .with_pair(
            Address::repeat_byte(0x22),
            (tok("WBNB", BSC).address, deep),
            (tok("ETH", BSC).address, deep),
        )
        .with_registry_decimals(BSC);
    AdapterRegistry::new().with_reader(BSC, Arc::new(reader))
}

/// 1000 KLC into a 1,000,000 wKLC / 300 USDT pool
#[tokio::test]
async fn test_klc_usdt_quote() {
    let registry = kaly_registry();
    let usdt = tok("USDT", KALYCHAIN).address;
    let quote = registry
        .get_quote(KALYCHAIN, NATIVE_ADDRESS, usdt, Decimal::from(1000))
        .await
        .unwrap();
    assert_eq!(quote.amount_out, Decimal::from_str("0.298802").unwrap());

    let impact = registry
        .calculate_price_impact(KALYCHAIN, NATIVE_ADDRESS, usdt, Decimal::from(1000))
        .await
        .unwrap();
    assert_eq!(impact, quote.price_impact_pct);
    assert!(impact > Decimal::from_str("0.3").unwrap());
}

#[tokio::test]
async fn test_zero_amount_and_repeat_quotes() {
    let registry = kaly_registry();
    let usdt = tok("USDT", KALYCHAIN).address;

    let zero = registry
        .get_quote(KALYCHAIN, NATIVE_ADDRESS, usdt, Decimal::ZERO)
        .await
        .unwrap();
    assert!(zero.amount_out.is_zero());

    let first = registry
        .get_quote(KALYCHAIN, NATIVE_ADDRESS, usdt, Decimal::from(25))
        .await
        .unwrap();
    let second = registry
        .get_quote(KALYCHAIN, NATIVE_ADDRESS, usdt, Decimal::from(25))
        .await
        .unwrap();
    assert_eq!(first.amount_out_raw, second.amount_out_raw);
    assert_eq!(first.price_impact_pct, second.price_impact_pct);
}

/// Swapping out and back loses two fees plus curve slippage, never gains
#[tokio::test]
async fn test_round_trip_loses_fees() {
    let registry = bsc_registry();
    let (cake, wbnb) = (tok("CAKE", BSC).address, tok("WBNB", BSC).address);

    let out = registry.get_quote(BSC, cake, wbnb, Decimal::ONE).await.unwrap();
    let back = registry.get_quote(BSC, wbnb, cake, out.amount_out).await.unwrap();
    assert!(back.amount_out < Decimal::ONE);
    // 0.25% per leg on a deep pool
    assert!(back.amount_out > Decimal::from_str("0.994").unwrap());
}

/// CAKE has no ETH pool on BSC, so the quote hops through WBNB
#[tokio::test]
async fn test_two_hop_quote_and_swap() {
    let registry = bsc_registry();
    let (cake, eth) = (tok("CAKE", BSC), tok("ETH", BSC));
    let wbnb = tok("WBNB", BSC).address;

    let quote = registry
        .get_quote(BSC, cake.address, eth.address, Decimal::from(10))
        .await
        .unwrap();
    assert_eq!(quote.route, vec![cake.address, wbnb, eth.address]);
    assert_eq!(quote.hops.len(), 2);

    let sender = RecordingSender::new(Address::repeat_byte(0x42));
    let params = SwapParams::from_quote(cake, eth, &quote, Address::repeat_byte(0x42));
    let hash = registry.execute_swap(BSC, &params, Some(&sender)).await.unwrap();

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert_eq!(tx.sighash(), hash);
    assert_eq!(tx.to(), Some(&NameOrAddress::Address(get_config(BSC).unwrap().router)));
    assert!(tx.value().map_or(true, |v| v.is_zero()));
    assert_eq!(tx.from(), Some(&Address::repeat_byte(0x42)));
}

#[tokio::test]
async fn test_reverted_swap_is_swap_failed() {
    let registry = kaly_registry();
    let (klc, usdt) = (tok("KLC", KALYCHAIN), tok("USDT", KALYCHAIN));
    let quote = registry
        .get_quote(KALYCHAIN, klc.address, usdt.address, Decimal::from(1000))
        .await
        .unwrap();
    let sender = RecordingSender::new(Address::repeat_byte(0x42)).reverting("INSUFFICIENT_OUTPUT_AMOUNT");
    let params = SwapParams::from_quote(klc, usdt, &quote, Address::repeat_byte(0x42));

    let err = registry.execute_swap(KALYCHAIN, &params, Some(&sender)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SwapFailed);
    assert!(err.to_string().contains("INSUFFICIENT_OUTPUT_AMOUNT"));
}

#[tokio::test]
async fn test_swap_without_sender_is_client_unavailable() {
    let registry = kaly_registry();
    let params = SwapParams::new(
        tok("KLC", KALYCHAIN),
        tok("USDT", KALYCHAIN),
        Decimal::ONE,
        Decimal::ONE,
        Address::repeat_byte(0x42),
    );
    let err = registry.execute_swap(KALYCHAIN, &params, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClientUnavailable);
}

#[tokio::test]
async fn test_liquidity_helpers() {
    let owner = Address::repeat_byte(0x42);
    let (usdt, wklc) = (tok("USDT", KALYCHAIN).address, tok("wKLC", KALYCHAIN).address);
    let router = get_config(KALYCHAIN).unwrap().router;
    let reader = InMemoryChainReader::new()
        .with_pair(Address::repeat_byte(0x11), (wklc, units(1_000_000, 18)), (usdt, units(300, 6)))
        .with_registry_decimals(KALYCHAIN)
        .with_balance(usdt, owner, units(50, 6))
        .with_native_balance(owner, units(7, 18))
        .with_allowance(usdt, owner, router, units(10, 6));
    let registry = AdapterRegistry::new().with_reader(KALYCHAIN, Arc::new(reader));

    let paired = registry
        .quote_liquidity(KALYCHAIN, usdt, NATIVE_ADDRESS, Decimal::from(3))
        .await
        .unwrap();
    assert_eq!(paired, Decimal::from(10_000));

    assert_eq!(registry.get_token_balance(KALYCHAIN, usdt, owner).await.unwrap(), Decimal::from(50));
    assert_eq!(registry.get_token_balance(KALYCHAIN, NATIVE_ADDRESS, owner).await.unwrap(), Decimal::from(7));

    assert!(!registry.needs_approval(KALYCHAIN, usdt, owner, Decimal::from(10)).await.unwrap());
    assert!(registry.needs_approval(KALYCHAIN, usdt, owner, Decimal::from(11)).await.unwrap());
    assert!(!registry.needs_approval(KALYCHAIN, NATIVE_ADDRESS, owner, Decimal::from(1_000)).await.unwrap());
}
