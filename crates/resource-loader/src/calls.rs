use alloy_sol_types::sol;

sol! {
    /// Immutable pool parameters as returned by the view logic.
    #[derive(Debug)]
    struct PoolConfig {
        address fetcher;
        bytes32 oracle;
        address reserveToken;
        uint256 k;
        uint256 mark;
        uint32 interestHalfLife;
        uint32 premiumHalfLife;
        uint32 maturity;
    }

    /// Reserve state as computed by the view logic against current storage.
    #[derive(Debug)]
    struct PoolStateView {
        uint256 R;
        uint256 a;
        uint256 b;
        uint256 rA;
        uint256 rB;
        uint256 rC;
        uint256 sA;
        uint256 sB;
        uint256 sC;
        uint256 twap;
        uint256 spot;
    }

    /// Stateless pool reader, attached over the logic address by state
    /// override; it never exists on-chain.
    interface PoolView {
        function loadConfig(address pool) external view returns (PoolConfig memory);
        function compute(address pool, address positionToken) external view returns (PoolStateView memory);
    }

    #[derive(Debug)]
    struct TokenInfo {
        string symbol;
        string name;
        uint256 decimals;
        uint256 totalSupply;
    }

    /// Batched token metadata lens, also attached by state override.
    interface TokenLens {
        function getTokenInfo(address[] calldata tokens) external view returns (TokenInfo[] memory);
    }

    /// The slice of an AMM pair the oracle parsing needs.
    interface AmmPair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    /// Plain ERC-20 metadata calls for the pair legs.
    interface Erc20Meta {
        function symbol() external view returns (string memory);
        function name() external view returns (string memory);
        function decimals() external view returns (uint8);
    }
}
