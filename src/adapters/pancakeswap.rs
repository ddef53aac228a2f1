//! PancakeSwap V2 on BNB Chain (56). 0.25% fee, bridges through USDT then
//! BUSD after WBNB.

use std::sync::Arc;

use crate::chain_reader::ChainReader;
use crate::chains::ProtocolConfig;
use crate::dex_adapter::{AmmCore, ProtocolAdapter};

#[derive(Clone)]
pub struct PancakeSwapAdapter {
    core: AmmCore,
}

impl PancakeSwapAdapter {
    pub fn new(config: Arc<ProtocolConfig>, reader: Arc<dyn ChainReader>) -> Self {
        Self {
            core: AmmCore::new(config, reader),
        }
    }
}

impl ProtocolAdapter for PancakeSwapAdapter {
    fn name(&self) -> &'static str {
        "PancakeSwap"
    }

    fn core(&self) -> &AmmCore {
        &self.core
    }
}
