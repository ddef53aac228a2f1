//! # Pair Resolver
//!
//! Locates the pool for two tokens through the chain's factory and snapshots
//! its state: reserves, LP supply, and constituent order.
//!
//! A missing pool is a valid answer (`PairInfo { exists: false, .. }`), not an
//! error. Any read that fails once the pool address is known surfaces as
//! `QueryFailed`; nothing is replaced by zero. Snapshots are never cached.

use std::sync::Arc;

use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::chain_reader::ChainReader;
use crate::chains::ProtocolConfig;
use crate::error::{DexError, DexResult};
use crate::metrics;
use crate::tokens::{is_native_address, token_by_address};
use crate::types::conversions::u256_to_decimal;

/// Decimals assumed when a token's `decimals()` read fails.
pub const DEFAULT_DECIMALS: u8 = 18;

/// V2 LP tokens always use 18 decimals.
pub(crate) const LP_DECIMALS: u8 = 18;

/// Point-in-time snapshot of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairInfo {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub decimals0: u8,
    pub decimals1: u8,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    pub reserve0_raw: U256,
    pub reserve1_raw: U256,
    pub total_supply: Decimal,
    pub total_supply_raw: U256,
    pub block_timestamp_last: u32,
    pub exists: bool,
}

impl PairInfo {
    /// Placeholder for a token pair without a deployed pool.
    pub fn missing(token_a: Address, token_b: Address) -> Self {
        let (token0, token1) = sort_tokens(token_a, token_b);
        Self {
            address: Address::zero(),
            token0,
            token1,
            decimals0: DEFAULT_DECIMALS,
            decimals1: DEFAULT_DECIMALS,
            reserve0: Decimal::ZERO,
            reserve1: Decimal::ZERO,
            reserve0_raw: U256::zero(),
            reserve1_raw: U256::zero(),
            total_supply: Decimal::ZERO,
            total_supply_raw: U256::zero(),
            block_timestamp_last: 0,
            exists: false,
        }
    }

    pub fn contains(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }

    /// Reserves and decimals oriented for a swap that sells `token_in`.
    pub fn oriented(&self, token_in: Address) -> Option<OrientedReserves> {
        if token_in == self.token0 {
            Some(OrientedReserves {
                reserve_in: self.reserve0_raw,
                reserve_out: self.reserve1_raw,
                decimals_in: self.decimals0,
                decimals_out: self.decimals1,
            })
        } else if token_in == self.token1 {
            Some(OrientedReserves {
                reserve_in: self.reserve1_raw,
                reserve_out: self.reserve0_raw,
                decimals_in: self.decimals1,
                decimals_out: self.decimals0,
            })
        } else {
            None
        }
    }

    pub fn has_liquidity(&self) -> bool {
        self.exists && !self.reserve0_raw.is_zero() && !self.reserve1_raw.is_zero()
    }
}

/// Pool reserves seen from the input side of a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedReserves {
    pub reserve_in: U256,
    pub reserve_out: U256,
    pub decimals_in: u8,
    pub decimals_out: u8,
}

/// Canonical V2 ordering: lower address first.
pub fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

/// CREATE2 pair address:
/// `keccak256(0xff ++ factory ++ keccak256(token0 ++ token1) ++ init_code_hash)[12..]`.
pub fn compute_pair_address(
    factory: Address,
    init_code_hash: H256,
    token_a: Address,
    token_b: Address,
) -> Address {
    let (token0, token1) = sort_tokens(token_a, token_b);
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(token0.as_bytes());
    packed[20..].copy_from_slice(token1.as_bytes());
    let salt = keccak256(packed);

    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(factory.as_bytes());
    preimage.extend_from_slice(&salt);
    preimage.extend_from_slice(init_code_hash.as_bytes());
    Address::from_slice(&keccak256(&preimage)[12..])
}

#[derive(Clone)]
pub struct PairResolver {
    config: Arc<ProtocolConfig>,
    reader: Arc<dyn ChainReader>,
}

impl PairResolver {
    pub fn new(config: Arc<ProtocolConfig>, reader: Arc<dyn ChainReader>) -> Self {
        Self { config, reader }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn reader(&self) -> &Arc<dyn ChainReader> {
        &self.reader
    }

    pub fn protocol(&self) -> &'static str {
        self.config.protocol_name()
    }

    /// On-chain address used for `token`: wrapped-native for the native
    /// pseudo-token.
    pub fn resolve(&self, token: Address) -> Address {
        if is_native_address(token) {
            self.config.wrapped_native
        } else {
            token
        }
    }

    /// Offline pair address. `None` when the deployment has no known init
    /// code hash.
    pub fn compute_pair_address(&self, token_a: Address, token_b: Address) -> Option<Address> {
        let init_code_hash = self.config.init_code_hash?;
        Some(compute_pair_address(
            self.config.factory,
            init_code_hash,
            self.resolve(token_a),
            self.resolve(token_b),
        ))
    }

    /// Factory lookup. `None` when the factory reports no pool.
    pub async fn pair_address(&self, token_a: Address, token_b: Address) -> DexResult<Option<Address>> {
        let a = self.resolve(token_a);
        let b = self.resolve(token_b);
        let pair = self
            .reader
            .get_pair(self.config.factory, a, b)
            .await
            .map_err(|e| {
                metrics::record_rpc_failure(self.protocol(), "getPair");
                DexError::query(self.protocol(), "factory getPair", e)
            })?;
        debug!("{}: getPair({:?}, {:?}) = {:?}", self.protocol(), a, b, pair);
        Ok((!pair.is_zero()).then_some(pair))
    }

    pub async fn pair_exists(&self, token_a: Address, token_b: Address) -> DexResult<bool> {
        Ok(self.pair_address(token_a, token_b).await?.is_some())
    }

    /// Snapshot of the pool for two tokens. Reserves, supply and constituent
    /// order are read concurrently together with both tokens' decimals.
    pub async fn get_pair_info(&self, token_a: Address, token_b: Address) -> DexResult<PairInfo> {
        let a = self.resolve(token_a);
        let b = self.resolve(token_b);
        match self.pair_address(a, b).await? {
            Some(pair) => self.read_pair(pair, a, b).await,
            None => Ok(PairInfo::missing(a, b)),
        }
    }

    /// Snapshot of a pool whose address is already known from the factory.
    pub async fn read_pair(&self, pair: Address, token_a: Address, token_b: Address) -> DexResult<PairInfo> {
        let a = self.resolve(token_a);
        let b = self.resolve(token_b);
        let reader = &self.reader;
        let state = async {
            futures::try_join!(
                reader.get_reserves(pair),
                reader.total_supply(pair),
                reader.token0(pair),
                reader.token1(pair),
            )
        };
        let decimals = async { futures::join!(reader.decimals(a), reader.decimals(b)) };
        let (state, (decimals_a, decimals_b)) = futures::join!(state, decimals);

        let (reserves, total_supply, token0, token1) = state.map_err(|e| {
            metrics::record_rpc_failure(self.protocol(), "pair state");
            DexError::query(self.protocol(), "pair state", e)
        })?;

        if !((token0 == a && token1 == b) || (token0 == b && token1 == a)) {
            return Err(DexError::QueryFailed {
                protocol: self.protocol(),
                operation: "pair state",
                message: format!(
                    "pair {:?} reports tokens {:?}/{:?}, expected {:?}/{:?}",
                    pair, token0, token1, a, b
                ),
            });
        }

        let decimals_a = self.decimals_or_default(a, decimals_a);
        let decimals_b = self.decimals_or_default(b, decimals_b);
        let (decimals0, decimals1) = if token0 == a {
            (decimals_a, decimals_b)
        } else {
            (decimals_b, decimals_a)
        };

        let scale = |raw: U256, decimals: u8| {
            u256_to_decimal(raw, decimals).map_err(|e| DexError::QueryFailed {
                protocol: self.protocol(),
                operation: "pair state",
                message: e.to_string(),
            })
        };

        Ok(PairInfo {
            address: pair,
            token0,
            token1,
            decimals0,
            decimals1,
            reserve0: scale(reserves.reserve0, decimals0)?,
            reserve1: scale(reserves.reserve1, decimals1)?,
            reserve0_raw: reserves.reserve0,
            reserve1_raw: reserves.reserve1,
            total_supply: scale(total_supply, LP_DECIMALS)?,
            total_supply_raw: total_supply,
            block_timestamp_last: reserves.block_timestamp_last,
            exists: true,
        })
    }

    /// Falls back to the token directory, then to `DEFAULT_DECIMALS` for
    /// unlisted tokens.
    fn decimals_or_default(&self, token: Address, read: anyhow::Result<u8>) -> u8 {
        match read {
            Ok(decimals) => decimals,
            Err(e) => {
                let fallback = token_by_address(self.config.chain_id, token)
                    .map(|t| t.decimals)
                    .unwrap_or(DEFAULT_DECIMALS);
                warn!(
                    "{}: decimals() failed for {:?}, assuming {}: {:#}",
                    self.protocol(),
                    token,
                    fallback,
                    e
                );
                fallback
            }
        }
    }
}
