use alloy_sol_types::sol;

sol! {
    /// Position swap routed through the router. `sideIn`/`sideOut` are packed
    /// position token ids (or the reserve/quote token address zero-extended).
    #[derive(Debug)]
    event Swap(
        address indexed payer,
        address indexed poolIn,
        address indexed poolOut,
        address recipient,
        uint256 sideIn,
        uint256 sideOut,
        uint256 amountIn,
        uint256 amountOut
    );

    /// Pool deployment announcement emitted by the deployer. The three
    /// indexed keys carry searchable identifiers (base/quote symbol hashes,
    /// creator) and are matched verbatim by keyword search.
    #[derive(Debug)]
    event PoolCreated(
        bytes32 indexed key1,
        bytes32 indexed key2,
        bytes32 indexed key3,
        address pool,
        bytes32 oracle,
        address reserveToken,
        uint256 k,
        uint256 mark
    );
}
