use alloy_sol_types::sol;

sol! {
    /// ERC-20 transfer. ERC-721 shares the topic but indexes the id, so its
    /// logs fail body decoding and fall out as unparsed.
    #[derive(Debug)]
    event Transfer(address indexed from, address indexed to, uint256 value);

    /// ERC-20 spending approval
    #[derive(Debug)]
    event Approval(address indexed owner, address indexed spender, uint256 value);

    /// ERC-1155 single-id transfer (position token)
    #[derive(Debug)]
    event TransferSingle(
        address indexed operator,
        address indexed from,
        address indexed to,
        uint256 id,
        uint256 value
    );

    /// ERC-1155 batched transfer (position token)
    #[derive(Debug)]
    event TransferBatch(
        address indexed operator,
        address indexed from,
        address indexed to,
        uint256[] ids,
        uint256[] values
    );

    /// ERC-1155 operator approval (position token)
    #[derive(Debug)]
    event ApprovalForAll(address indexed account, address indexed operator, bool approved);
}
