//! # Chain Reader
//!
//! Read-only access to a chain's contracts. The routing core never opens its
//! own connections; callers hand it a `ChainReader` per chain. The ethers
//! implementation wraps any `Middleware` (an HTTP provider in production).
//!
//! Reads are plain request/response calls: no retries, no timeouts of our own.
//! Transient failures propagate to the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::prelude::*;

use crate::contracts::{Erc20, IUniswapV2Factory, IUniswapV2Pair};

/// Raw `getReserves()` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReserves {
    pub reserve0: U256,
    pub reserve1: U256,
    pub block_timestamp_last: u32,
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Factory `getPair`. Returns the zero address when no pool exists.
    async fn get_pair(&self, factory: Address, token_a: Address, token_b: Address) -> Result<Address>;

    async fn get_reserves(&self, pair: Address) -> Result<RawReserves>;

    async fn total_supply(&self, token: Address) -> Result<U256>;

    async fn token0(&self, pair: Address) -> Result<Address>;

    async fn token1(&self, pair: Address) -> Result<Address>;

    async fn decimals(&self, token: Address) -> Result<u8>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256>;

    async fn native_balance(&self, owner: Address) -> Result<U256>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;
}

/// `ChainReader` backed by an ethers middleware.
#[derive(Clone)]
pub struct EthersChainReader<M: Middleware> {
    client: Arc<M>,
}

impl<M: Middleware + 'static> EthersChainReader<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> Arc<M> {
        Arc::clone(&self.client)
    }
}

impl EthersChainReader<Provider<Http>> {
    /// Plain HTTP JSON-RPC reader.
    pub fn connect_http(url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(url)
            .with_context(|| format!("invalid RPC endpoint {}", url))?;
        Ok(Self::new(Arc::new(provider)))
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainReader for EthersChainReader<M> {
    async fn get_pair(&self, factory: Address, token_a: Address, token_b: Address) -> Result<Address> {
        let factory = IUniswapV2Factory::new(factory, Arc::clone(&self.client));
        let pair = factory
            .get_pair(token_a, token_b)
            .call()
            .await
            .context("factory getPair")?;
        Ok(pair)
    }

    async fn get_reserves(&self, pair: Address) -> Result<RawReserves> {
        let contract = IUniswapV2Pair::new(pair, Arc::clone(&self.client));
        let (reserve0, reserve1, block_timestamp_last) = contract
            .get_reserves()
            .call()
            .await
            .context("pair getReserves")?;
        Ok(RawReserves {
            reserve0: U256::from(reserve0),
            reserve1: U256::from(reserve1),
            block_timestamp_last,
        })
    }

    async fn total_supply(&self, token: Address) -> Result<U256> {
        let contract = IUniswapV2Pair::new(token, Arc::clone(&self.client));
        contract
            .total_supply()
            .call()
            .await
            .context("totalSupply")
    }

    async fn token0(&self, pair: Address) -> Result<Address> {
        let contract = IUniswapV2Pair::new(pair, Arc::clone(&self.client));
        contract
            .method::<_, Address>("token0", ())?
            .call()
            .await
            .context("pair token0")
    }

    async fn token1(&self, pair: Address) -> Result<Address> {
        let contract = IUniswapV2Pair::new(pair, Arc::clone(&self.client));
        contract
            .method::<_, Address>("token1", ())?
            .call()
            .await
            .context("pair token1")
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        let contract = Erc20::new(token, Arc::clone(&self.client));
        contract.decimals().call().await.context("erc20 decimals")
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        let contract = Erc20::new(token, Arc::clone(&self.client));
        contract
            .balance_of(owner)
            .call()
            .await
            .context("erc20 balanceOf")
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.client
            .get_balance(owner, None)
            .await
            .map_err(|e| anyhow::anyhow!("eth_getBalance: {}", e))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let contract = Erc20::new(token, Arc::clone(&self.client));
        contract
            .allowance(owner, spender)
            .call()
            .await
            .context("erc20 allowance")
    }
}
