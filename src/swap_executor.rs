//! # Swap Executor
//!
//! Builds router calls for exact-input swaps and hands them to a
//! caller-supplied [`TxSender`]. The executor never signs, never approves
//! tokens and never waits for confirmation: it returns the transaction hash
//! as soon as the sender has broadcast it.
//!
//! Call variant by endpoint:
//!
//! | input  | output | router function                          | value     |
//! |--------|--------|------------------------------------------|-----------|
//! | native | token  | `swapExact{ETH,KLC}ForTokens`            | amount in |
//! | token  | native | `swapExactTokensFor{ETH,KLC}`            | 0         |
//! | token  | token  | `swapExactTokensForTokens`               | 0         |

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use ethers::abi::Token as AbiToken;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{DexError, DexResult};
use crate::metrics;
use crate::quote_engine::Quote;
use crate::router::{is_well_formed, RouteFinder};
use crate::tokens::{is_native_address, Token};
use crate::types::conversions::decimal_to_u256;
use crate::v2_math::apply_slippage;

pub const DEFAULT_SLIPPAGE_PCT: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
pub const DEFAULT_DEADLINE_MINUTES: u64 = 20;

/// Broadcast capability supplied by the caller. Any signing or user
/// authorization happens before the executor is invoked.
#[async_trait]
pub trait TxSender: Send + Sync {
    /// Account the transaction is sent from, if known.
    fn from_address(&self) -> Option<Address>;

    async fn send_transaction(&self, tx: TypedTransaction) -> anyhow::Result<TxHash>;
}

/// `TxSender` over an ethers middleware, typically a `SignerMiddleware`.
pub struct MiddlewareSender<M: Middleware> {
    client: Arc<M>,
}

impl<M: Middleware + 'static> MiddlewareSender<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<M: Middleware + 'static> TxSender for MiddlewareSender<M> {
    fn from_address(&self) -> Option<Address> {
        self.client.default_sender()
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> anyhow::Result<TxHash> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| anyhow!("{}", e))?;
        Ok(pending.tx_hash())
    }
}

#[derive(Debug, Clone)]
pub struct SwapParams {
    pub token_in: Token,
    pub token_out: Token,
    /// Exact input, decimal units of `token_in`.
    pub amount_in: Decimal,
    /// Expected output the minimum is derived from.
    pub quoted_amount_out: Decimal,
    pub slippage_pct: Decimal,
    pub recipient: Address,
    pub deadline_minutes: u64,
    /// Route to swap along. Re-derived when `None`.
    pub route: Option<Vec<Address>>,
}

impl SwapParams {
    pub fn new(
        token_in: Token,
        token_out: Token,
        amount_in: Decimal,
        quoted_amount_out: Decimal,
        recipient: Address,
    ) -> Self {
        Self {
            token_in,
            token_out,
            amount_in,
            quoted_amount_out,
            slippage_pct: DEFAULT_SLIPPAGE_PCT,
            recipient,
            deadline_minutes: DEFAULT_DEADLINE_MINUTES,
            route: None,
        }
    }

    /// Parameters that execute `quote` as quoted, along its route.
    pub fn from_quote(token_in: Token, token_out: Token, quote: &Quote, recipient: Address) -> Self {
        Self::new(token_in, token_out, quote.amount_in, quote.amount_out, recipient).with_route(quote.route.clone())
    }

    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    pub fn with_deadline_minutes(mut self, minutes: u64) -> Self {
        self.deadline_minutes = minutes;
        self
    }

    pub fn with_route(mut self, route: Vec<Address>) -> Self {
        self.route = Some(route);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapCall {
    NativeForTokens,
    TokensForNative,
    TokensForTokens,
}

impl SwapCall {
    pub fn select(token_in: &Token, token_out: &Token) -> Self {
        if token_in.is_native || is_native_address(token_in.address) {
            SwapCall::NativeForTokens
        } else if token_out.is_native || is_native_address(token_out.address) {
            SwapCall::TokensForNative
        } else {
            SwapCall::TokensForTokens
        }
    }
}

/// Fully encoded router call, ready to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTransaction {
    pub to: Address,
    pub call: SwapCall,
    pub function: &'static str,
    pub data: Bytes,
    pub value: U256,
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub deadline: u64,
    pub route: Vec<Address>,
}

impl SwapTransaction {
    pub fn to_typed(&self, from: Option<Address>) -> TypedTransaction {
        let mut request = TransactionRequest::new()
            .to(self.to)
            .data(self.data.clone())
            .value(self.value);
        if let Some(from) = from {
            request = request.from(from);
        }
        request.into()
    }
}

#[derive(Clone)]
pub struct SwapExecutor {
    finder: RouteFinder,
}

impl SwapExecutor {
    pub fn new(finder: RouteFinder) -> Self {
        Self { finder }
    }

    fn protocol(&self) -> &'static str {
        self.finder.resolver().protocol()
    }

    /// Encodes the router call for `params` along `route` without sending it.
    /// `now_unix` anchors the deadline.
    pub fn build_swap_transaction(
        &self,
        params: &SwapParams,
        route: &[Address],
        now_unix: u64,
    ) -> DexResult<SwapTransaction> {
        let protocol = self.protocol();
        let resolver = self.finder.resolver();
        let config = resolver.config();

        for token in [&params.token_in, &params.token_out] {
            if token.chain_id != config.chain_id {
                return Err(DexError::UnsupportedToken {
                    protocol,
                    chain_id: config.chain_id,
                    token: format!("{} ({:?}) from chain {}", token.symbol, token.address, token.chain_id),
                });
            }
        }
        if route.is_empty() {
            return Err(DexError::NoRoute {
                protocol,
                token_in: params.token_in.address,
                token_out: params.token_out.address,
            });
        }
        if !is_well_formed(route) {
            return Err(DexError::invalid(protocol, format!("malformed route of {} tokens", route.len())));
        }
        let first = resolver.resolve(params.token_in.address);
        let last = resolver.resolve(params.token_out.address);
        if route[0] != first || route[route.len() - 1] != last {
            return Err(DexError::invalid(
                protocol,
                format!("route {:?} does not connect {:?} to {:?}", route, first, last),
            ));
        }
        if params.amount_in <= Decimal::ZERO {
            return Err(DexError::invalid(protocol, format!("amount in must be positive, got {}", params.amount_in)));
        }
        if params.slippage_pct < Decimal::ZERO || params.slippage_pct >= Decimal::ONE_HUNDRED {
            return Err(DexError::invalid(protocol, format!("slippage {}% out of range", params.slippage_pct)));
        }
        if params.deadline_minutes == 0 {
            return Err(DexError::invalid(protocol, "deadline must be at least one minute"));
        }

        let amount_in = decimal_to_u256(params.amount_in, params.token_in.decimals)
            .map_err(|e| DexError::invalid(protocol, e.to_string()))?;
        let min_out = apply_slippage(params.quoted_amount_out, params.slippage_pct);
        let amount_out_min = decimal_to_u256(min_out, params.token_out.decimals)
            .map_err(|e| DexError::invalid(protocol, e.to_string()))?;
        let deadline = now_unix.saturating_add(params.deadline_minutes.saturating_mul(60));

        let call = SwapCall::select(&params.token_in, &params.token_out);
        let dex = config.dex;
        let function_name = match call {
            SwapCall::NativeForTokens => dex.native_in_function(),
            SwapCall::TokensForNative => dex.native_out_function(),
            SwapCall::TokensForTokens => dex.token_to_token_function(),
        };

        let path = AbiToken::Array(route.iter().map(|a| AbiToken::Address(*a)).collect());
        let mut args = Vec::with_capacity(5);
        if call != SwapCall::NativeForTokens {
            args.push(AbiToken::Uint(amount_in));
        }
        args.push(AbiToken::Uint(amount_out_min));
        args.push(path);
        args.push(AbiToken::Address(params.recipient));
        args.push(AbiToken::Uint(U256::from(deadline)));

        let data = dex
            .router_abi()
            .function(function_name)
            .and_then(|f| f.encode_input(&args))
            .map_err(|e| DexError::invalid(protocol, format!("encoding {}: {}", function_name, e)))?;

        Ok(SwapTransaction {
            to: config.router,
            call,
            function: function_name,
            data: data.into(),
            value: if call == SwapCall::NativeForTokens { amount_in } else { U256::zero() },
            amount_in,
            amount_out_min,
            deadline,
            route: route.to_vec(),
        })
    }

    /// Builds and broadcasts the swap. Fails before any chain access when
    /// the supplied route is empty or no sender is available.
    pub async fn execute_swap(&self, params: &SwapParams, sender: Option<&dyn TxSender>) -> DexResult<TxHash> {
        let protocol = self.protocol();
        let no_route = || DexError::NoRoute {
            protocol,
            token_in: params.token_in.address,
            token_out: params.token_out.address,
        };

        if matches!(&params.route, Some(route) if route.is_empty()) {
            return Err(no_route());
        }
        let sender = sender.ok_or(DexError::ClientUnavailable {
            protocol,
            what: "wallet/client",
        })?;

        let route = match &params.route {
            Some(route) => route.clone(),
            None => {
                self.finder
                    .get_swap_route(params.token_in.address, params.token_out.address)
                    .await?
            }
        };
        if route.is_empty() {
            return Err(no_route());
        }

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let tx = self.build_swap_transaction(params, &route, now)?;
        let hash = sender
            .send_transaction(tx.to_typed(sender.from_address()))
            .await
            .map_err(|e| {
                warn!("{}: {} failed: {:#}", protocol, tx.function, e);
                DexError::SwapFailed {
                    protocol,
                    reason: format!("{:#}", e),
                }
            })?;

        info!(
            "{}: submitted {} {} {} -> {} (min out {}), tx {:?}",
            protocol, tx.function, params.amount_in, params.token_in.symbol, params.token_out.symbol, tx.amount_out_min, hash
        );
        metrics::record_swap_submitted(protocol);
        Ok(hash)
    }
}
