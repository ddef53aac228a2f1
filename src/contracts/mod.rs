// Contracts Module - Public ABIs Only

pub mod erc20;
pub mod i_kalyswap_router;
pub mod i_uniswap_v2_factory;
pub mod i_uniswap_v2_pair;
pub mod i_uniswap_v2_router;

// Public exports
pub use erc20::Erc20;
pub use i_kalyswap_router::KALYSWAP_ROUTER_ABI;
pub use i_uniswap_v2_factory::IUniswapV2Factory;
pub use i_uniswap_v2_pair::IUniswapV2Pair;
pub use i_uniswap_v2_router::UNISWAP_V2_ROUTER_ABI;
