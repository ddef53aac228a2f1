//! # Chain Registry
//!
//! Static per-chain protocol configuration: which AMM deployment serves the
//! chain, its factory/router/wrapped-native addresses, fee schedule, CREATE2
//! init-code hash, ordered bridge-asset preference and canonical token list.
//!
//! The table is compiled into the crate and never mutated. Lookups are pure
//! and return `None` for unknown chains.

use std::collections::HashMap;

use ethers::types::{Address, H256};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::router::DexId;
use crate::tokens::{Token, NATIVE_ADDRESS};

pub type ChainId = u64;

pub const KALYCHAIN: ChainId = 3888;
pub const BSC: ChainId = 56;
pub const ARBITRUM: ChainId = 42161;

/// Trading fee taken out of the input amount, e.g. 30/10000 = 0.3%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FeeRate {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Multiplier applied to the input amount (`denominator - numerator`).
    pub fn input_multiplier(&self) -> u32 {
        self.denominator.saturating_sub(self.numerator)
    }
}

/// Static configuration of one chain's AMM deployment.
#[derive(Debug, Clone, Serialize)]
pub struct ProtocolConfig {
    pub chain_id: ChainId,
    pub chain_name: &'static str,
    pub dex: DexId,
    pub factory: Address,
    pub router: Address,
    pub wrapped_native: Address,
    /// Pair creation code hash for offline address derivation. `None` when
    /// the deployment's hash is not known; the factory stays authoritative.
    pub init_code_hash: Option<H256>,
    pub fee: FeeRate,
    /// Intermediate assets tried, in order, after the wrapped-native hub.
    pub bridge_tokens: Vec<Address>,
    /// Canonical token list. The first entry is the native pseudo-token.
    pub tokens: Vec<Token>,
}

impl ProtocolConfig {
    pub fn protocol_name(&self) -> &'static str {
        self.dex.name()
    }

    pub fn native_token(&self) -> Option<&Token> {
        self.tokens.iter().find(|t| t.is_native)
    }
}

fn addr(s: &str) -> Address {
    s.parse().expect("static address literal")
}

fn hash(s: &str) -> H256 {
    s.parse().expect("static hash literal")
}

fn token(
    chain_id: ChainId,
    address: Address,
    decimals: u8,
    name: &str,
    symbol: &str,
    logo: &str,
) -> Token {
    Token {
        chain_id,
        address,
        decimals,
        name: name.to_string(),
        symbol: symbol.to_string(),
        logo_uri: logo.to_string(),
        is_native: address == NATIVE_ADDRESS,
    }
}

fn kalychain() -> ProtocolConfig {
    let wklc = addr("0x069255299Bb729399f3CECaBdc73d15d3D10a2A3");
    let usdt = addr("0x2CA775C77B922A51FcF3097F52bFFdbc0250D99A");
    let usdc = addr("0x9cAb0c396cF0F4325913f2269a0b72BD4d46E3A9");
    let c = KALYCHAIN;
    ProtocolConfig {
        chain_id: c,
        chain_name: "KalyChain",
        dex: DexId::KalySwap,
        factory: addr("0xD42Af909d323D88e0E933B6c50D3e91c279004ca"),
        router: addr("0x183F288BF7EEBe1A3f318F4681dF4a70ef32B2f3"),
        wrapped_native: wklc,
        init_code_hash: None,
        fee: FeeRate::new(30, 10_000),
        bridge_tokens: vec![usdt, usdc],
        tokens: vec![
            token(c, NATIVE_ADDRESS, 18, "KalyCoin", "KLC", "/tokens/klc.png"),
            token(c, wklc, 18, "Wrapped KalyCoin", "wKLC", "/tokens/wklc.png"),
            token(c, usdt, 6, "Tether USD", "USDT", "/tokens/usdt.png"),
            token(c, usdc, 6, "USD Coin", "USDC", "/tokens/usdc.png"),
            token(
                c,
                addr("0x6E92CAC380F7A7B86f4163fad0df2F277B16Edc6"),
                18,
                "Dai Stablecoin",
                "DAI",
                "/tokens/dai.png",
            ),
            token(
                c,
                addr("0xCC93b84cEed74Dc28c746b7697d6fA477ffFf65a"),
                18,
                "KalySwap Token",
                "KSWAP",
                "/tokens/kswap.png",
            ),
        ],
    }
}

fn bsc() -> ProtocolConfig {
    let wbnb = addr("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");
    let usdt = addr("0x55d398326f99059fF775485246999027B3197955");
    let busd = addr("0xe9e7CEA3DedcA5984780Bafc599bD69ADd087D56");
    let c = BSC;
    ProtocolConfig {
        chain_id: c,
        chain_name: "BNB Smart Chain",
        dex: DexId::PancakeSwap,
        factory: addr("0xcA143Ce32Fe78f1f7019d7d551a6402fC5350c73"),
        router: addr("0x10ED43C718714eb63d5aA57B78B54704E256024E"),
        wrapped_native: wbnb,
        init_code_hash: Some(hash("0x00fb7f630766e6a796048ea87d01acd3068e8ff67d078148a3fa3f4a84f69bd5")),
        fee: FeeRate::new(25, 10_000),
        bridge_tokens: vec![usdt, busd],
        tokens: vec![
            token(c, NATIVE_ADDRESS, 18, "BNB", "BNB", "/tokens/bnb.png"),
            token(c, wbnb, 18, "Wrapped BNB", "WBNB", "/tokens/wbnb.png"),
            token(c, usdt, 18, "Tether USD", "USDT", "/tokens/usdt.png"),
            token(c, busd, 18, "Binance USD", "BUSD", "/tokens/busd.png"),
            token(
                c,
                addr("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"),
                18,
                "USD Coin",
                "USDC",
                "/tokens/usdc.png",
            ),
            token(
                c,
                addr("0x0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82"),
                18,
                "PancakeSwap Token",
                "CAKE",
                "/tokens/cake.png",
            ),
            token(
                c,
                addr("0x2170Ed0880ac9A755fd29B2688956BD959F933F8"),
                18,
                "Ethereum Token",
                "ETH",
                "/tokens/eth.png",
            ),
        ],
    }
}

fn arbitrum() -> ProtocolConfig {
    let weth = addr("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1");
    let usdc = addr("0xaf88d065e77c8cC2239327C5EDb3A432268e5831");
    let usdt = addr("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9");
    let c = ARBITRUM;
    ProtocolConfig {
        chain_id: c,
        chain_name: "Arbitrum One",
        dex: DexId::UniswapV2,
        factory: addr("0xf1D7CC64Fb4452F05c498126312eBE29f30Fbcf9"),
        router: addr("0x4752ba5DBc23f44D87826276BF6Fd6b1C372aD24"),
        wrapped_native: weth,
        init_code_hash: Some(hash("0x96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f")),
        fee: FeeRate::new(30, 10_000),
        bridge_tokens: vec![usdc, usdt],
        tokens: vec![
            token(c, NATIVE_ADDRESS, 18, "Ether", "ETH", "/tokens/eth.png"),
            token(c, weth, 18, "Wrapped Ether", "WETH", "/tokens/weth.png"),
            token(c, usdc, 6, "USD Coin", "USDC", "/tokens/usdc.png"),
            token(c, usdt, 6, "Tether USD", "USDT", "/tokens/usdt.png"),
            token(
                c,
                addr("0x912CE59144191C1204E64559FE8253a0e49E6548"),
                18,
                "Arbitrum",
                "ARB",
                "/tokens/arb.png",
            ),
            token(
                c,
                addr("0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1"),
                18,
                "Dai Stablecoin",
                "DAI",
                "/tokens/dai.png",
            ),
        ],
    }
}

static REGISTRY: Lazy<HashMap<ChainId, ProtocolConfig>> = Lazy::new(|| {
    [kalychain(), bsc(), arbitrum()]
        .into_iter()
        .map(|config| (config.chain_id, config))
        .collect()
});

/// Returns the protocol configuration for `chain_id`, if the chain is supported.
pub fn get_config(chain_id: ChainId) -> Option<&'static ProtocolConfig> {
    REGISTRY.get(&chain_id)
}

/// All supported chain ids, ascending.
pub fn supported_chains() -> Vec<ChainId> {
    let mut ids: Vec<ChainId> = REGISTRY.keys().copied().collect();
    ids.sort_unstable();
    ids
}

pub fn is_supported(chain_id: ChainId) -> bool {
    REGISTRY.contains_key(&chain_id)
}
