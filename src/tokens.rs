//! # Token Directory
//!
//! Lookups over the chain registry's token lists. All functions are pure and
//! report "not found" as `None`.

use std::str::FromStr;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::chains::{self, ChainId};

/// Reserved address denoting a chain's native coin.
pub const NATIVE_ADDRESS: Address = Address::zero();

/// A fungible asset on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: ChainId,
    pub address: Address,
    pub decimals: u8,
    pub name: String,
    pub symbol: String,
    pub logo_uri: String,
    pub is_native: bool,
}

impl Token {
    /// Address used on-chain for routing: the wrapped-native token for the
    /// native pseudo-token, the token's own address otherwise.
    pub fn routing_address(&self) -> Option<Address> {
        routing_address(self.chain_id, self.address)
    }
}

pub fn is_native_address(address: Address) -> bool {
    address == NATIVE_ADDRESS
}

/// Canonical token list for a chain; empty for unsupported chains.
pub fn get_token_list(chain_id: ChainId) -> &'static [Token] {
    chains::get_config(chain_id)
        .map(|c| c.tokens.as_slice())
        .unwrap_or(&[])
}

/// Case-insensitive lookup of a hex address string. Searches every chain
/// when `chain_id` is `None`.
pub fn find_token_by_address(address: &str, chain_id: Option<ChainId>) -> Option<&'static Token> {
    let address = Address::from_str(address.trim()).ok()?;
    match chain_id {
        Some(chain_id) => token_by_address(chain_id, address),
        None => chains::supported_chains()
            .into_iter()
            .find_map(|chain_id| token_by_address(chain_id, address)),
    }
}

pub fn token_by_address(chain_id: ChainId, address: Address) -> Option<&'static Token> {
    get_token_list(chain_id).iter().find(|t| t.address == address)
}

pub fn find_token_by_symbol(symbol: &str, chain_id: ChainId) -> Option<&'static Token> {
    let symbol = symbol.trim();
    get_token_list(chain_id)
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}

/// Resolves either a symbol or an address string against one chain.
pub fn find_token(query: &str, chain_id: ChainId) -> Option<&'static Token> {
    if query.trim_start().starts_with("0x") {
        find_token_by_address(query, Some(chain_id))
    } else {
        find_token_by_symbol(query, chain_id)
    }
}

pub fn native_token(chain_id: ChainId) -> Option<&'static Token> {
    chains::get_config(chain_id).and_then(|c| c.native_token())
}

/// Substitutes the wrapped-native address for the native pseudo-token.
/// `None` only when the chain is unsupported.
pub fn routing_address(chain_id: ChainId, address: Address) -> Option<Address> {
    let config = chains::get_config(chain_id)?;
    if is_native_address(address) {
        Some(config.wrapped_native)
    } else {
        Some(address)
    }
}
