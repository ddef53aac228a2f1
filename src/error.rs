//! # Error Taxonomy
//!
//! Every failure surfaced by the routing core is a [`DexError`]. Each variant
//! carries the protocol name it originated from (except `UnsupportedChain`,
//! which is raised before any protocol is selected) and maps to a
//! machine-readable [`ErrorKind`] through [`DexError::kind`].
//!
//! "Pool does not exist" is not an error: `get_pair_info` reports it as a
//! `PairInfo` with `exists == false`. `PairNotFound` is only raised by
//! operations that need the pool to be there.

use ethers::types::Address;
use serde::Serialize;
use thiserror::Error;

use crate::chains::ChainId;

/// Machine-readable failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedChain,
    PairNotFound,
    NoRoute,
    InsufficientLiquidity,
    UnsupportedToken,
    SwapFailed,
    QueryFailed,
    ClientUnavailable,
    InvalidInput,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedChain => "unsupported_chain",
            ErrorKind::PairNotFound => "pair_not_found",
            ErrorKind::NoRoute => "no_route",
            ErrorKind::InsufficientLiquidity => "insufficient_liquidity",
            ErrorKind::UnsupportedToken => "unsupported_token",
            ErrorKind::SwapFailed => "swap_failed",
            ErrorKind::QueryFailed => "query_failed",
            ErrorKind::ClientUnavailable => "client_unavailable",
            ErrorKind::InvalidInput => "invalid_input",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum DexError {
    #[error("Chain {chain_id} has no registered protocol adapter")]
    UnsupportedChain { chain_id: ChainId },

    #[error("{protocol}: no pool exists for {token_a:?}/{token_b:?}")]
    PairNotFound {
        protocol: &'static str,
        token_a: Address,
        token_b: Address,
    },

    #[error("{protocol}: no liquidity route from {token_in:?} to {token_out:?}")]
    NoRoute {
        protocol: &'static str,
        token_in: Address,
        token_out: Address,
    },

    #[error("{protocol}: pool {pair:?} has an empty reserve")]
    InsufficientLiquidity {
        protocol: &'static str,
        pair: Address,
    },

    #[error("{protocol}: token {token:?} is not listed on chain {chain_id}")]
    UnsupportedToken {
        protocol: &'static str,
        chain_id: ChainId,
        token: String,
    },

    #[error("{protocol}: swap failed: {reason}")]
    SwapFailed {
        protocol: &'static str,
        reason: String,
    },

    #[error("{protocol}: {operation} query failed: {message}")]
    QueryFailed {
        protocol: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("{protocol}: no {what} available")]
    ClientUnavailable {
        protocol: &'static str,
        what: &'static str,
    },

    #[error("{protocol}: invalid input: {reason}")]
    InvalidInput {
        protocol: &'static str,
        reason: String,
    },
}

impl DexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DexError::UnsupportedChain { .. } => ErrorKind::UnsupportedChain,
            DexError::PairNotFound { .. } => ErrorKind::PairNotFound,
            DexError::NoRoute { .. } => ErrorKind::NoRoute,
            DexError::InsufficientLiquidity { .. } => ErrorKind::InsufficientLiquidity,
            DexError::UnsupportedToken { .. } => ErrorKind::UnsupportedToken,
            DexError::SwapFailed { .. } => ErrorKind::SwapFailed,
            DexError::QueryFailed { .. } => ErrorKind::QueryFailed,
            DexError::ClientUnavailable { .. } => ErrorKind::ClientUnavailable,
            DexError::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }

    /// Name of the protocol adapter that raised the error.
    pub fn protocol(&self) -> &'static str {
        match self {
            DexError::UnsupportedChain { .. } => "dispatcher",
            DexError::PairNotFound { protocol, .. }
            | DexError::NoRoute { protocol, .. }
            | DexError::InsufficientLiquidity { protocol, .. }
            | DexError::UnsupportedToken { protocol, .. }
            | DexError::SwapFailed { protocol, .. }
            | DexError::QueryFailed { protocol, .. }
            | DexError::ClientUnavailable { protocol, .. }
            | DexError::InvalidInput { protocol, .. } => protocol,
        }
    }

    pub(crate) fn query(protocol: &'static str, operation: &'static str, err: anyhow::Error) -> Self {
        DexError::QueryFailed {
            protocol,
            operation,
            message: format!("{:#}", err),
        }
    }

    pub(crate) fn invalid(protocol: &'static str, reason: impl Into<String>) -> Self {
        DexError::InvalidInput {
            protocol,
            reason: reason.into(),
        }
    }
}

pub type DexResult<T> = std::result::Result<T, DexError>;
