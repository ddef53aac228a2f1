use ethers::prelude::*;

abigen!(
    IUniswapV2Pair,
    r#"[
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
        function totalSupply() external view returns (uint256)
        function token0() external view returns (address)
        function token1() external view returns (address)
        function balanceOf(address owner) external view returns (uint256)
    ]"#
);
