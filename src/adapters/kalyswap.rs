//! KalySwap on KalyChain (3888). Native coin KLC, wrapped as wKLC; router
//! entry points for the native coin are named after KLC.

use std::sync::Arc;

use crate::chain_reader::ChainReader;
use crate::chains::ProtocolConfig;
use crate::dex_adapter::{AmmCore, ProtocolAdapter};

#[derive(Clone)]
pub struct KalySwapAdapter {
    core: AmmCore,
}

impl KalySwapAdapter {
    pub fn new(config: Arc<ProtocolConfig>, reader: Arc<dyn ChainReader>) -> Self {
        Self {
            core: AmmCore::new(config, reader),
        }
    }
}

impl ProtocolAdapter for KalySwapAdapter {
    fn name(&self) -> &'static str {
        "KalySwap"
    }

    fn core(&self) -> &AmmCore {
        &self.core
    }
}
