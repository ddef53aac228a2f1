//! # DEX Router SDK
//!
//! Routing and quoting core for constant-product DEX deployments on several
//! chains: KalySwap on KalyChain, PancakeSwap V2 on BNB Chain and Uniswap V2
//! on Arbitrum One.
//!
//! ## Overview
//!
//! Given a chain id and two tokens, the SDK answers:
//!
//! - **Can this trade happen?** Pair lookup through the chain's factory.
//! - **Along which route?** Direct pair, else a hop through the wrapped
//!   native token, else a hop through one of the chain's bridge stablecoins.
//! - **For how much?** Constant-product output and price impact over live
//!   reserves, composed across hops.
//! - **With which call?** Router call data for the native-in, native-out or
//!   token-to-token swap variant, with minimum output and deadline applied.
//!
//! ## Architecture
//!
//! ### Registry Layer
//! Static chain table (`chains`) and token lookups (`tokens`). Pure data.
//!
//! ### Chain Layer
//! `ChainReader` and `TxSender` seams; ethers-backed implementations and
//! in-memory doubles (`mocks`).
//!
//! ### Routing Layer
//! `PairResolver` -> `RouteFinder` -> `QuoteEngine` / `SwapExecutor`, bundled
//! per chain by a `ProtocolAdapter`.
//!
//! ### Dispatch Layer
//! `AdapterRegistry` picks and caches the adapter for a chain id.

// Registry
/// Static per-chain protocol configuration
pub mod chains;
/// Token directory lookups
pub mod tokens;
/// Common types and conversions
pub mod types;

// Chain access
/// Read seam over factory, pair and ERC-20 contracts
pub mod chain_reader;
/// Smart contract ABIs
pub mod contracts;
/// In-memory readers and senders for tests and demos
pub mod mocks;

// Routing
/// Pool lookup and state snapshots
pub mod pair_resolver;
/// Route primitives and route finding
pub mod router;
/// Constant-product math
pub mod v2_math;
/// Quotes over a route
pub mod quote_engine;
/// Router call encoding and submission
pub mod swap_executor;

// Protocols
/// Trait shared by protocol adapters
pub mod dex_adapter;
/// Per-chain protocol adapters
pub mod adapters;
/// Chain id to adapter dispatch
pub mod dispatcher;

// Infrastructure
/// Error taxonomy
pub mod error;
/// Metrics and observability
pub mod metrics;
/// Configuration management
pub mod settings;

// Re-exports for convenience
pub use chains::{get_config, ChainId, ProtocolConfig};
pub use dex_adapter::ProtocolAdapter;
pub use dispatcher::AdapterRegistry;
pub use error::{DexError, DexResult, ErrorKind};
pub use pair_resolver::PairInfo;
pub use quote_engine::Quote;
pub use settings::Settings;
pub use swap_executor::{SwapParams, SwapTransaction, TxSender};
pub use tokens::Token;
