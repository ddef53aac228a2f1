//! # Dispatcher
//!
//! Single entry point for callers. Resolves the adapter for a chain id,
//! building it on first use and reusing it afterwards, and forwards each
//! operation to it.
//!
//! The registry is caller-owned; there is no global instance. Chains that
//! are in the chain table but have no configured reader still answer pure
//! lookups (config, token list) and report `ClientUnavailable` for anything
//! that needs the chain.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use ethers::types::{Address, TxHash};
use log::{debug, info};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::adapters::build_adapter;
use crate::chain_reader::{ChainReader, EthersChainReader};
use crate::chains::{self, ChainId, ProtocolConfig};
use crate::dex_adapter::{PoolPosition, ProtocolAdapter};
use crate::error::{DexError, DexResult};
use crate::metrics;
use crate::pair_resolver::PairInfo;
use crate::quote_engine::Quote;
use crate::settings::Settings;
use crate::swap_executor::{SwapParams, SwapTransaction, TxSender};
use crate::tokens::{self, Token};

#[derive(Default)]
pub struct AdapterRegistry {
    readers: HashMap<ChainId, Arc<dyn ChainReader>>,
    adapters: DashMap<ChainId, Arc<dyn ProtocolAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `reader` for all on-chain reads on `chain_id`.
    pub fn with_reader(mut self, chain_id: ChainId, reader: Arc<dyn ChainReader>) -> Self {
        self.readers.insert(chain_id, reader);
        self.adapters.remove(&chain_id);
        self
    }

    /// One HTTP reader per configured endpoint. Endpoints for chains outside
    /// the chain table are ignored.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut registry = Self::new();
        for (chain_id, url) in settings.endpoints() {
            if !chains::is_supported(chain_id) {
                log::warn!("Ignoring RPC endpoint for unsupported chain {}", chain_id);
                continue;
            }
            let reader = EthersChainReader::connect_http(url)?;
            info!("Chain {}: reading through {}", chain_id, url);
            registry = registry.with_reader(chain_id, Arc::new(reader));
        }
        Ok(registry)
    }

    pub fn supported_chains(&self) -> Vec<ChainId> {
        chains::supported_chains()
    }

    pub fn get_config(&self, chain_id: ChainId) -> DexResult<&'static ProtocolConfig> {
        chains::get_config(chain_id).ok_or(DexError::UnsupportedChain { chain_id })
    }

    pub fn get_token_list(&self, chain_id: ChainId) -> DexResult<&'static [Token]> {
        self.get_config(chain_id)?;
        Ok(tokens::get_token_list(chain_id))
    }

    /// Adapter for `chain_id`, constructed on first request.
    pub fn adapter(&self, chain_id: ChainId) -> DexResult<Arc<dyn ProtocolAdapter>> {
        if let Some(adapter) = self.adapters.get(&chain_id) {
            return Ok(Arc::clone(adapter.value()));
        }
        let config = self.get_config(chain_id)?;
        let reader = self.readers.get(&chain_id).ok_or(DexError::ClientUnavailable {
            protocol: config.protocol_name(),
            what: "chain reader",
        })?;
        // Concurrent first requests may both build; the first insert wins.
        let built = build_adapter(Arc::new(config.clone()), Arc::clone(reader));
        debug!("Built {} adapter for chain {}", built.name(), chain_id);
        let entry = self.adapters.entry(chain_id).or_insert(built);
        Ok(Arc::clone(entry.value()))
    }

    fn observe<T>(&self, result: DexResult<T>) -> DexResult<T> {
        if let Err(e) = &result {
            metrics::record_failure(e.protocol(), e.kind());
        }
        result
    }

    #[instrument(skip(self))]
    pub async fn get_quote(
        &self,
        chain_id: ChainId,
        token_in: Address,
        token_out: Address,
        amount_in: Decimal,
    ) -> DexResult<Quote> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.get_quote(token_in, token_out, amount_in).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    #[instrument(skip(self, params, sender), fields(token_in = %params.token_in.symbol, token_out = %params.token_out.symbol))]
    pub async fn execute_swap(
        &self,
        chain_id: ChainId,
        params: &SwapParams,
        sender: Option<&dyn TxSender>,
    ) -> DexResult<TxHash> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.execute_swap(params, sender).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    pub fn build_swap_transaction(
        &self,
        chain_id: ChainId,
        params: &SwapParams,
        route: &[Address],
        now_unix: u64,
    ) -> DexResult<SwapTransaction> {
        let result = self
            .adapter(chain_id)
            .and_then(|adapter| adapter.build_swap_transaction(params, route, now_unix));
        self.observe(result)
    }

    #[instrument(skip(self))]
    pub async fn get_pair_info(&self, chain_id: ChainId, token_a: Address, token_b: Address) -> DexResult<PairInfo> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.get_pair_info(token_a, token_b).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    #[instrument(skip(self))]
    pub async fn get_swap_route(
        &self,
        chain_id: ChainId,
        token_in: Address,
        token_out: Address,
    ) -> DexResult<Vec<Address>> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.get_swap_route(token_in, token_out).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    #[instrument(skip(self))]
    pub async fn calculate_price_impact(
        &self,
        chain_id: ChainId,
        token_in: Address,
        token_out: Address,
        amount_in: Decimal,
    ) -> DexResult<Decimal> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.calculate_price_impact(token_in, token_out, amount_in).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    #[instrument(skip(self))]
    pub async fn can_swap_directly(&self, chain_id: ChainId, token_in: Address, token_out: Address) -> DexResult<bool> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.can_swap_directly(token_in, token_out).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    #[instrument(skip(self))]
    pub async fn quote_liquidity(
        &self,
        chain_id: ChainId,
        token_a: Address,
        token_b: Address,
        amount_a: Decimal,
    ) -> DexResult<Decimal> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.quote_liquidity(token_a, token_b, amount_a).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    #[instrument(skip(self))]
    pub async fn get_pool_position(
        &self,
        chain_id: ChainId,
        token_a: Address,
        token_b: Address,
        owner: Address,
    ) -> DexResult<PoolPosition> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.get_pool_position(token_a, token_b, owner).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    #[instrument(skip(self))]
    pub async fn get_token_balance(&self, chain_id: ChainId, token: Address, owner: Address) -> DexResult<Decimal> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.get_token_balance(token, owner).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    #[instrument(skip(self))]
    pub async fn needs_approval(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        amount: Decimal,
    ) -> DexResult<bool> {
        let result = match self.adapter(chain_id) {
            Ok(adapter) => adapter.needs_approval(token, owner, amount).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }
}
