//! # Protocol Adapter Trait
//!
//! The uniform surface every chain's AMM deployment exposes to the
//! dispatcher. The three supported deployments are all constant-product V2
//! forks and differ only in their [`ProtocolConfig`] (addresses, fee,
//! init-code hash, bridge preference, router call family), so the operations
//! are provided once by [`AmmCore`] and the trait's default methods delegate
//! to it.
//!
//! ## Adding a chain
//!
//! 1. Add the chain's entry to the registry in `chains.rs`
//! 2. Add a `DexId` variant (and router ABI if its call names differ)
//! 3. Add an adapter struct under `adapters/` and map it in `build_adapter`
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dex_router_sdk::adapters::KalySwapAdapter;
//! use dex_router_sdk::chain_reader::EthersChainReader;
//! use dex_router_sdk::chains::{get_config, KALYCHAIN};
//! use dex_router_sdk::dex_adapter::ProtocolAdapter;
//! use dex_router_sdk::tokens::{find_token_by_symbol, NATIVE_ADDRESS};
//! use rust_decimal::Decimal;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let reader = Arc::new(EthersChainReader::connect_http("https://rpc.kalychain.io/rpc")?);
//! let config = Arc::new(get_config(KALYCHAIN).unwrap().clone());
//! let adapter = KalySwapAdapter::new(config, reader);
//! let usdt = find_token_by_symbol("USDT", KALYCHAIN).unwrap();
//! let quote = adapter.get_quote(NATIVE_ADDRESS, usdt.address, Decimal::from(1000)).await?;
//! println!("{} USDT, impact {}%", quote.amount_out, quote.price_impact_pct);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::chain_reader::ChainReader;
use crate::chains::{ChainId, ProtocolConfig};
use crate::error::{DexError, DexResult};
use crate::pair_resolver::{PairInfo, PairResolver, LP_DECIMALS};
use crate::quote_engine::{Quote, QuoteEngine};
use crate::router::RouteFinder;
use crate::swap_executor::{SwapExecutor, SwapParams, SwapTransaction, TxSender};
use crate::tokens::{get_token_list, is_native_address, token_by_address, Token};
use crate::types::conversions::{decimal_to_u256, u256_to_decimal};
use crate::v2_math::{self, AmmMathError};

/// An account's share of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolPosition {
    pub pair: Address,
    pub token0: Address,
    pub token1: Address,
    pub lp_balance: Decimal,
    pub lp_balance_raw: U256,
    pub share_pct: Decimal,
    pub amount0: Decimal,
    pub amount1: Decimal,
}

/// Routing, quoting and execution for one V2 deployment.
#[derive(Clone)]
pub struct AmmCore {
    config: Arc<ProtocolConfig>,
    finder: RouteFinder,
    quotes: QuoteEngine,
    executor: SwapExecutor,
}

impl AmmCore {
    pub fn new(config: Arc<ProtocolConfig>, reader: Arc<dyn ChainReader>) -> Self {
        let resolver = PairResolver::new(Arc::clone(&config), reader);
        let finder = RouteFinder::new(resolver);
        Self {
            config,
            quotes: QuoteEngine::new(finder.clone()),
            executor: SwapExecutor::new(finder.clone()),
            finder,
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn resolver(&self) -> &PairResolver {
        self.finder.resolver()
    }

    pub fn finder(&self) -> &RouteFinder {
        &self.finder
    }

    pub fn quotes(&self) -> &QuoteEngine {
        &self.quotes
    }

    pub fn executor(&self) -> &SwapExecutor {
        &self.executor
    }

    fn protocol(&self) -> &'static str {
        self.config.protocol_name()
    }

    fn reader(&self) -> &Arc<dyn ChainReader> {
        self.resolver().reader()
    }

    /// Registry entry for `address` on this chain.
    pub fn require_token(&self, address: Address) -> DexResult<&'static Token> {
        token_by_address(self.config.chain_id, address).ok_or_else(|| DexError::UnsupportedToken {
            protocol: self.protocol(),
            chain_id: self.config.chain_id,
            token: format!("{:?}", address),
        })
    }

    async fn existing_pair(&self, token_a: Address, token_b: Address) -> DexResult<PairInfo> {
        let info = self.resolver().get_pair_info(token_a, token_b).await?;
        if !info.exists {
            return Err(DexError::PairNotFound {
                protocol: self.protocol(),
                token_a,
                token_b,
            });
        }
        Ok(info)
    }

    /// Amount of `token_b` matching `amount_a` of `token_a` at the pool's
    /// current ratio.
    pub async fn quote_liquidity(&self, token_a: Address, token_b: Address, amount_a: Decimal) -> DexResult<Decimal> {
        let protocol = self.protocol();
        let info = self.existing_pair(token_a, token_b).await?;
        let reserves = info
            .oriented(self.resolver().resolve(token_a))
            .ok_or_else(|| DexError::invalid(protocol, "token is not part of the pair"))?;
        let raw_a = decimal_to_u256(amount_a, reserves.decimals_in).map_err(|e| DexError::invalid(protocol, e.to_string()))?;
        let raw_b = v2_math::quote_liquidity(raw_a, reserves.reserve_in, reserves.reserve_out).map_err(|e| match e {
            AmmMathError::EmptyReserve => DexError::InsufficientLiquidity {
                protocol,
                pair: info.address,
            },
            other => DexError::invalid(protocol, other.to_string()),
        })?;
        u256_to_decimal(raw_b, reserves.decimals_out).map_err(|e| DexError::invalid(protocol, e.to_string()))
    }

    /// LP balance of `owner` in the `token_a`/`token_b` pool and the
    /// underlying amounts it redeems for.
    pub async fn get_pool_position(&self, token_a: Address, token_b: Address, owner: Address) -> DexResult<PoolPosition> {
        let protocol = self.protocol();
        let info = self.existing_pair(token_a, token_b).await?;
        let lp = self
            .reader()
            .balance_of(info.address, owner)
            .await
            .map_err(|e| DexError::query(protocol, "lp balanceOf", e))?;

        let underlying = |reserve: U256| -> DexResult<U256> {
            if info.total_supply_raw.is_zero() {
                return Ok(U256::zero());
            }
            let product = lp
                .checked_mul(reserve)
                .ok_or_else(|| DexError::invalid(protocol, "pool position overflows"))?;
            Ok(product / info.total_supply_raw)
        };
        let scale = |raw: U256, decimals: u8| u256_to_decimal(raw, decimals).map_err(|e| DexError::invalid(protocol, e.to_string()));

        let lp_balance = scale(lp, LP_DECIMALS)?;
        let share_pct = lp_balance
            .checked_div(info.total_supply)
            .and_then(|s| s.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO);

        Ok(PoolPosition {
            pair: info.address,
            token0: info.token0,
            token1: info.token1,
            lp_balance,
            lp_balance_raw: lp,
            share_pct,
            amount0: scale(underlying(info.reserve0_raw)?, info.decimals0)?,
            amount1: scale(underlying(info.reserve1_raw)?, info.decimals1)?,
        })
    }

    /// Balance of a listed token; the native pseudo-token reads the account
    /// balance.
    pub async fn get_token_balance(&self, token: Address, owner: Address) -> DexResult<Decimal> {
        let protocol = self.protocol();
        let listed = self.require_token(token)?;
        let raw = if listed.is_native {
            self.reader().native_balance(owner).await
        } else {
            self.reader().balance_of(listed.address, owner).await
        }
        .map_err(|e| DexError::query(protocol, "balance", e))?;
        u256_to_decimal(raw, listed.decimals).map_err(|e| DexError::invalid(protocol, e.to_string()))
    }

    /// Whether the router's allowance for `owner` is below `amount`. Native
    /// input never needs approval.
    pub async fn needs_approval(&self, token: Address, owner: Address, amount: Decimal) -> DexResult<bool> {
        let protocol = self.protocol();
        let listed = self.require_token(token)?;
        if listed.is_native || is_native_address(listed.address) {
            return Ok(false);
        }
        let required = decimal_to_u256(amount, listed.decimals).map_err(|e| DexError::invalid(protocol, e.to_string()))?;
        let allowance = self
            .reader()
            .allowance(listed.address, owner, self.config.router)
            .await
            .map_err(|e| DexError::query(protocol, "allowance", e))?;
        Ok(allowance < required)
    }
}

#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn core(&self) -> &AmmCore;

    fn chain_id(&self) -> ChainId {
        self.core().config().chain_id
    }

    fn config(&self) -> &ProtocolConfig {
        self.core().config()
    }

    fn router_address(&self) -> Address {
        self.config().router
    }

    fn factory_address(&self) -> Address {
        self.config().factory
    }

    fn weth_address(&self) -> Address {
        self.config().wrapped_native
    }

    fn get_token_list(&self) -> &'static [Token] {
        get_token_list(self.chain_id())
    }

    fn require_token(&self, address: Address) -> DexResult<&'static Token> {
        self.core().require_token(address)
    }

    fn compute_pair_address(&self, token_a: Address, token_b: Address) -> Option<Address> {
        self.core().resolver().compute_pair_address(token_a, token_b)
    }

    fn build_swap_transaction(&self, params: &SwapParams, route: &[Address], now_unix: u64) -> DexResult<SwapTransaction> {
        self.core().executor().build_swap_transaction(params, route, now_unix)
    }

    async fn get_quote(&self, token_in: Address, token_out: Address, amount_in: Decimal) -> DexResult<Quote> {
        self.core().quotes().get_quote(token_in, token_out, amount_in).await
    }

    async fn execute_swap(&self, params: &SwapParams, sender: Option<&dyn TxSender>) -> DexResult<TxHash> {
        self.core().executor().execute_swap(params, sender).await
    }

    async fn get_pair_info(&self, token_a: Address, token_b: Address) -> DexResult<PairInfo> {
        self.core().resolver().get_pair_info(token_a, token_b).await
    }

    async fn get_swap_route(&self, token_in: Address, token_out: Address) -> DexResult<Vec<Address>> {
        self.core().finder().get_swap_route(token_in, token_out).await
    }

    async fn calculate_price_impact(&self, token_in: Address, token_out: Address, amount_in: Decimal) -> DexResult<Decimal> {
        self.core().quotes().calculate_price_impact(token_in, token_out, amount_in).await
    }

    async fn can_swap_directly(&self, token_in: Address, token_out: Address) -> DexResult<bool> {
        self.core().finder().can_swap_directly(token_in, token_out).await
    }

    async fn quote_liquidity(&self, token_a: Address, token_b: Address, amount_a: Decimal) -> DexResult<Decimal> {
        self.core().quote_liquidity(token_a, token_b, amount_a).await
    }

    async fn get_pool_position(&self, token_a: Address, token_b: Address, owner: Address) -> DexResult<PoolPosition> {
        self.core().get_pool_position(token_a, token_b, owner).await
    }

    async fn get_token_balance(&self, token: Address, owner: Address) -> DexResult<Decimal> {
        self.core().get_token_balance(token, owner).await
    }

    async fn needs_approval(&self, token: Address, owner: Address, amount: Decimal) -> DexResult<bool> {
        self.core().needs_approval(token, owner, amount).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::{get_config, ARBITRUM};
    use crate::error::ErrorKind;
    use crate::mocks::InMemoryChainReader;
    use crate::tokens::{find_token_by_symbol, NATIVE_ADDRESS};
    use std::str::FromStr;

    fn amm(reader: InMemoryChainReader) -> AmmCore {
        let config = Arc::new(get_config(ARBITRUM).unwrap().clone());
        AmmCore::new(config, Arc::new(reader.with_registry_decimals(ARBITRUM)))
    }

    fn sym(symbol: &str) -> Address {
        find_token_by_symbol(symbol, ARBITRUM).unwrap().address
    }

    fn owner() -> Address {
        Address::repeat_byte(0x77)
    }

    fn weth_usdc(pair: Address) -> InMemoryChainReader {
        InMemoryChainReader::new()
            .with_pair(pair, (sym("WETH"), U256::exp10(20)), (sym("USDC"), U256::from(300_000u64) * U256::exp10(6)))
            .with_total_supply(pair, U256::exp10(20))
    }

    #[tokio::test]
    async fn test_quote_liquidity_uses_pool_ratio() {
        let core = amm(weth_usdc(Address::repeat_byte(0x31)));
        let usdc = core.quote_liquidity(NATIVE_ADDRESS, sym("USDC"), Decimal::ONE).await.unwrap();
        assert_eq!(usdc, Decimal::from(3000));
        let weth = core.quote_liquidity(sym("USDC"), sym("WETH"), Decimal::from(1500)).await.unwrap();
        assert_eq!(weth, Decimal::from_str("0.5").unwrap());
    }

    #[tokio::test]
    async fn test_quote_liquidity_without_pool() {
        let err = amm(InMemoryChainReader::new())
            .quote_liquidity(sym("ARB"), sym("DAI"), Decimal::ONE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PairNotFound);
    }

    #[tokio::test]
    async fn test_pool_position_share() {
        let pair = Address::repeat_byte(0x32);
        let reader = weth_usdc(pair).with_balance(pair, owner(), U256::exp10(19));
        let position = amm(reader).get_pool_position(sym("WETH"), sym("USDC"), owner()).await.unwrap();
        assert_eq!(position.share_pct, Decimal::from(10));
        assert_eq!(position.lp_balance, Decimal::from(10));
        let (weth, usdc) = if position.token0 == sym("WETH") {
            (position.amount0, position.amount1)
        } else {
            (position.amount1, position.amount0)
        };
        assert_eq!(weth, Decimal::from(10));
        assert_eq!(usdc, Decimal::from(30_000));
    }

    #[tokio::test]
    async fn test_balances_native_and_erc20() {
        let reader = InMemoryChainReader::new()
            .with_native_balance(owner(), U256::exp10(18) * 2)
            .with_balance(sym("USDC"), owner(), U256::from(1_500_000u64));
        let core = amm(reader);
        assert_eq!(core.get_token_balance(NATIVE_ADDRESS, owner()).await.unwrap(), Decimal::from(2));
        assert_eq!(
            core.get_token_balance(sym("USDC"), owner()).await.unwrap(),
            Decimal::from_str("1.5").unwrap()
        );
        let err = core.get_token_balance(Address::repeat_byte(0x99), owner()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedToken);
    }

    #[tokio::test]
    async fn test_needs_approval_against_router() {
        let router = get_config(ARBITRUM).unwrap().router;
        let reader = InMemoryChainReader::new().with_allowance(sym("USDC"), owner(), router, U256::from(5_000_000u64));
        let core = amm(reader);
        assert!(!core.needs_approval(sym("USDC"), owner(), Decimal::from(5)).await.unwrap());
        assert!(core.needs_approval(sym("USDC"), owner(), Decimal::from(6)).await.unwrap());
        assert!(!core.needs_approval(NATIVE_ADDRESS, owner(), Decimal::from(1_000)).await.unwrap());
    }
}
