// DEX Adapters Module
// One adapter per supported chain's AMM deployment

pub mod kalyswap;
pub mod pancakeswap;
pub mod uniswap_v2;

use std::sync::Arc;

use crate::chain_reader::ChainReader;
use crate::chains::ProtocolConfig;
use crate::router::DexId;

// Re-export the trait
pub use crate::dex_adapter::ProtocolAdapter;
pub use kalyswap::KalySwapAdapter;
pub use pancakeswap::PancakeSwapAdapter;
pub use uniswap_v2::UniswapV2Adapter;

/// Adapter serving `config`'s deployment.
pub fn build_adapter(config: Arc<ProtocolConfig>, reader: Arc<dyn ChainReader>) -> Arc<dyn ProtocolAdapter> {
    match config.dex {
        DexId::KalySwap => Arc::new(KalySwapAdapter::new(config, reader)),
        DexId::PancakeSwap => Arc::new(PancakeSwapAdapter::new(config, reader)),
        DexId::UniswapV2 => Arc::new(UniswapV2Adapter::new(config, reader)),
    }
}
