//! Router ABI shared by Uniswap V2 and PancakeSwap V2 deployments.

use ethers::abi::{parse_abi, Abi};
use once_cell::sync::Lazy;

pub static UNISWAP_V2_ROUTER_ABI: Lazy<Abi> = Lazy::new(|| {
    parse_abi(&[
        "function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) external returns (uint256[] amounts)",
        "function swapExactETHForTokens(uint256 amountOutMin, address[] path, address to, uint256 deadline) external payable returns (uint256[] amounts)",
        "function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) external returns (uint256[] amounts)",
        "function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts)",
    ])
    .expect("static router ABI")
});
