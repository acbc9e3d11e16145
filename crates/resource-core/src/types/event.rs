use super::log::RawLog;
use alloy_primitives::{Address, B256, U256};

/// Closed set of events the engine understands. Anything else classifies as
/// `Unparsed` and is dropped by the reducers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        value: U256,
    },
    Approval {
        token: Address,
        owner: Address,
        spender: Address,
        value: U256,
    },
    TransferSingle {
        operator: Address,
        from: Address,
        to: Address,
        id: U256,
        value: U256,
    },
    TransferBatch {
        operator: Address,
        from: Address,
        to: Address,
        ids: Vec<U256>,
        values: Vec<U256>,
    },
    ApprovalForAll {
        account: Address,
        operator: Address,
        approved: bool,
    },
    Swap {
        payer: Address,
        pool_in: Address,
        pool_out: Address,
        recipient: Address,
        side_in: U256,
        side_out: U256,
        amount_in: U256,
        amount_out: U256,
    },
    PoolCreated {
        pool: Address,
        oracle: B256,
        reserve_token: Address,
        k: U256,
        mark: U256,
        keys: [B256; 3],
    },
    Unparsed,
}

/// A raw log paired with its decoded meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLog {
    pub raw: RawLog,
    pub event: DomainEvent,
}

impl ClassifiedLog {
    pub fn ordering_key(&self) -> (u64, u64) {
        self.raw.ordering_key()
    }

    pub fn identity(&self) -> (B256, u64) {
        self.raw.identity()
    }
}
