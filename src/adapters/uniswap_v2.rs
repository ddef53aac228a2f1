//! Uniswap V2 on Arbitrum One (42161).

use std::sync::Arc;

use crate::chain_reader::ChainReader;
use crate::chains::ProtocolConfig;
use crate::dex_adapter::{AmmCore, ProtocolAdapter};

#[derive(Clone)]
pub struct UniswapV2Adapter {
    core: AmmCore,
}

impl UniswapV2Adapter {
    pub fn new(config: Arc<ProtocolConfig>, reader: Arc<dyn ChainReader>) -> Self {
        Self {
            core: AmmCore::new(config, reader),
        }
    }
}

impl ProtocolAdapter for UniswapV2Adapter {
    fn name(&self) -> &'static str {
        "UniswapV2"
    }

    fn core(&self) -> &AmmCore {
        &self.core
    }
}
