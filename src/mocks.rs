//! In-memory chain doubles for tests and offline demos.
//!
//! `InMemoryChainReader` answers factory, pair and ERC-20 reads from maps
//! configured up front; `RecordingSender` captures transactions instead of
//! broadcasting them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TxHash, U256};

use crate::chain_reader::{ChainReader, RawReserves};
use crate::chains::ChainId;
use crate::pair_resolver::sort_tokens;
use crate::swap_executor::TxSender;
use crate::tokens::get_token_list;

#[derive(Debug, Clone)]
struct MockPair {
    address: Address,
    token0: Address,
    token1: Address,
    reserve0: U256,
    reserve1: U256,
    total_supply: U256,
}

#[derive(Default)]
pub struct InMemoryChainReader {
    pairs: HashMap<(Address, Address), MockPair>,
    by_address: HashMap<Address, (Address, Address)>,
    decimals: HashMap<Address, u8>,
    balances: HashMap<(Address, Address), U256>,
    native_balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    failing_pairs: HashSet<Address>,
    failing_factory: bool,
    get_pair_calls: AtomicUsize,
    state_calls: AtomicUsize,
}

impl InMemoryChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pool holding `reserve_a` of token A and `reserve_b` of
    /// token B. LP supply defaults to the larger reserve.
    pub fn with_pair(mut self, pair: Address, a: (Address, U256), b: (Address, U256)) -> Self {
        let (token0, token1) = sort_tokens(a.0, b.0);
        let (reserve0, reserve1) = if token0 == a.0 { (a.1, b.1) } else { (b.1, a.1) };
        self.pairs.insert(
            (token0, token1),
            MockPair {
                address: pair,
                token0,
                token1,
                reserve0,
                reserve1,
                total_supply: reserve0.max(reserve1),
            },
        );
        self.by_address.insert(pair, (token0, token1));
        self
    }

    pub fn with_total_supply(mut self, pair: Address, supply: U256) -> Self {
        if let Some(key) = self.by_address.get(&pair) {
            if let Some(p) = self.pairs.get_mut(key) {
                p.total_supply = supply;
            }
        }
        self
    }

    pub fn with_decimals(mut self, token: Address, decimals: u8) -> Self {
        self.decimals.insert(token, decimals);
        self
    }

    /// Loads decimals for every listed token of `chain_id`.
    pub fn with_registry_decimals(mut self, chain_id: ChainId) -> Self {
        for token in get_token_list(chain_id) {
            if !token.is_native {
                self.decimals.insert(token.address, token.decimals);
            }
        }
        self
    }

    pub fn with_balance(mut self, token: Address, owner: Address, amount: U256) -> Self {
        self.balances.insert((token, owner), amount);
        self
    }

    pub fn with_native_balance(mut self, owner: Address, amount: U256) -> Self {
        self.native_balances.insert(owner, amount);
        self
    }

    pub fn with_allowance(mut self, token: Address, owner: Address, spender: Address, amount: U256) -> Self {
        self.allowances.insert((token, owner, spender), amount);
        self
    }

    /// State reads against `pair` fail from now on.
    pub fn failing_pair(mut self, pair: Address) -> Self {
        self.failing_pairs.insert(pair);
        self
    }

    /// Every factory lookup fails.
    pub fn failing_factory(mut self) -> Self {
        self.failing_factory = true;
        self
    }

    pub fn get_pair_calls(&self) -> usize {
        self.get_pair_calls.load(Ordering::SeqCst)
    }

    /// Number of pair state reads (reserves, supply, token0/1).
    pub fn state_calls(&self) -> usize {
        self.state_calls.load(Ordering::SeqCst)
    }

    fn pair_state(&self, pair: Address) -> Result<&MockPair> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_pairs.contains(&pair) {
            return Err(anyhow!("execution reverted: rpc unavailable for {:?}", pair));
        }
        self.by_address
            .get(&pair)
            .and_then(|key| self.pairs.get(key))
            .ok_or_else(|| anyhow!("no contract at {:?}", pair))
    }
}

#[async_trait]
impl ChainReader for InMemoryChainReader {
    async fn get_pair(&self, _factory: Address, token_a: Address, token_b: Address) -> Result<Address> {
        self.get_pair_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_factory {
            return Err(anyhow!("factory getPair: connection refused"));
        }
        Ok(self
            .pairs
            .get(&sort_tokens(token_a, token_b))
            .map(|p| p.address)
            .unwrap_or_else(Address::zero))
    }

    async fn get_reserves(&self, pair: Address) -> Result<RawReserves> {
        let p = self.pair_state(pair)?;
        Ok(RawReserves {
            reserve0: p.reserve0,
            reserve1: p.reserve1,
            block_timestamp_last: 1_700_000_000,
        })
    }

    async fn total_supply(&self, token: Address) -> Result<U256> {
        Ok(self.pair_state(token)?.total_supply)
    }

    async fn token0(&self, pair: Address) -> Result<Address> {
        Ok(self.pair_state(pair)?.token0)
    }

    async fn token1(&self, pair: Address) -> Result<Address> {
        Ok(self.pair_state(pair)?.token1)
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        self.decimals
            .get(&token)
            .copied()
            .ok_or_else(|| anyhow!("decimals() reverted for {:?}", token))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        Ok(self.balances.get(&(token, owner)).copied().unwrap_or_default())
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        Ok(self.native_balances.get(&owner).copied().unwrap_or_default())
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(self
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }
}

/// `TxSender` that records transactions and returns a deterministic hash.
#[derive(Default)]
pub struct RecordingSender {
    from: Option<Address>,
    revert_reason: Option<String>,
    sent: Mutex<Vec<TypedTransaction>>,
}

impl RecordingSender {
    pub fn new(from: Address) -> Self {
        Self {
            from: Some(from),
            ..Self::default()
        }
    }

    /// Every submission fails with `reason`.
    pub fn reverting(mut self, reason: &str) -> Self {
        self.revert_reason = Some(reason.to_string());
        self
    }

    pub fn sent(&self) -> Vec<TypedTransaction> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TxSender for RecordingSender {
    fn from_address(&self) -> Option<Address> {
        self.from
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> Result<TxHash> {
        if let Some(reason) = &self.revert_reason {
            return Err(anyhow!("execution reverted: {}", reason));
        }
        let hash: TxHash = tx.sighash();
        self.sent
            .lock()
            .map_err(|_| anyhow!("sender state poisoned"))?
            .push(tx);
        Ok(hash)
    }
}
