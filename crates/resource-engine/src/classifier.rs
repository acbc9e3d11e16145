use alloy_sol_types::SolEvent;
use resource_core::events::{
    Approval, ApprovalForAll, PoolCreated, Swap, Transfer, TransferBatch, TransferSingle,
};
use resource_core::types::{ClassifiedLog, DomainEvent, RawLog};
use resource_core::ResourceConfig;
use tracing::warn;

/// Decode a raw log into its domain meaning. Unknown signatures and decode
/// failures classify as `Unparsed` instead of erroring; raw bytes are kept
/// either way.
pub fn classify(raw: &RawLog) -> ClassifiedLog {
    let event = decode(raw).unwrap_or(DomainEvent::Unparsed);
    ClassifiedLog {
        raw: raw.clone(),
        event,
    }
}

fn decode(raw: &RawLog) -> Option<DomainEvent> {
    let topic0 = raw.topic0()?;
    let data = raw.log_data();
    match topic0 {
        t if t == Transfer::SIGNATURE_HASH => {
            let ev = Transfer::decode_log_data(&data).ok()?;
            Some(DomainEvent::Transfer {
                token: raw.address,
                from: ev.from,
                to: ev.to,
                value: ev.value,
            })
        }
        t if t == Approval::SIGNATURE_HASH => {
            let ev = Approval::decode_log_data(&data).ok()?;
            Some(DomainEvent::Approval {
                token: raw.address,
                owner: ev.owner,
                spender: ev.spender,
                value: ev.value,
            })
        }
        t if t == TransferSingle::SIGNATURE_HASH => {
            let ev = TransferSingle::decode_log_data(&data).ok()?;
            Some(DomainEvent::TransferSingle {
                operator: ev.operator,
                from: ev.from,
                to: ev.to,
                id: ev.id,
                value: ev.value,
            })
        }
        t if t == TransferBatch::SIGNATURE_HASH => {
            let ev = TransferBatch::decode_log_data(&data).ok()?;
            Some(DomainEvent::TransferBatch {
                operator: ev.operator,
                from: ev.from,
                to: ev.to,
                ids: ev.ids,
                values: ev.values,
            })
        }
        t if t == ApprovalForAll::SIGNATURE_HASH => {
            let ev = ApprovalForAll::decode_log_data(&data).ok()?;
            Some(DomainEvent::ApprovalForAll {
                account: ev.account,
                operator: ev.operator,
                approved: ev.approved,
            })
        }
        t if t == Swap::SIGNATURE_HASH => {
            let ev = Swap::decode_log_data(&data).ok()?;
            Some(DomainEvent::Swap {
                payer: ev.payer,
                pool_in: ev.poolIn,
                pool_out: ev.poolOut,
                recipient: ev.recipient,
                side_in: ev.sideIn,
                side_out: ev.sideOut,
                amount_in: ev.amountIn,
                amount_out: ev.amountOut,
            })
        }
        t if t == PoolCreated::SIGNATURE_HASH => {
            let ev = PoolCreated::decode_log_data(&data).ok()?;
            Some(DomainEvent::PoolCreated {
                pool: ev.pool,
                oracle: ev.oracle,
                reserve_token: ev.reserveToken,
                k: ev.k,
                mark: ev.mark,
                keys: [ev.key1, ev.key2, ev.key3],
            })
        }
        _ => None,
    }
}

/// Classify a chain-ordered batch, dropping what nothing downstream reads.
pub fn classify_logs(logs: &[RawLog]) -> Vec<ClassifiedLog> {
    let mut out = Vec::with_capacity(logs.len());
    let mut dropped = 0usize;
    for raw in logs {
        let classified = classify(raw);
        if classified.event == DomainEvent::Unparsed {
            dropped += 1;
            continue;
        }
        out.push(classified);
    }
    if dropped > 0 {
        warn!(dropped, kept = out.len(), "Dropped unparsed logs");
    }
    out
}

/// Position token activity: 1155 transfers and operator approvals on the
/// shared position token, at or after its deployment block.
pub fn is_position_log(config: &ResourceConfig, log: &ClassifiedLog) -> bool {
    matches!(
        log.event,
        DomainEvent::TransferSingle { .. }
            | DomainEvent::TransferBatch { .. }
            | DomainEvent::ApprovalForAll { .. }
    ) && log.raw.address == config.position_token
        && log.raw.block_number >= config.start_block
}

pub fn is_swap_log(config: &ResourceConfig, log: &ClassifiedLog) -> bool {
    matches!(log.event, DomainEvent::Swap { .. }) && log.raw.address == config.router
}

pub fn is_erc20_transfer_log(log: &ClassifiedLog) -> bool {
    matches!(log.event, DomainEvent::Transfer { .. })
}

fn is_erc20_approval_log(log: &ClassifiedLog) -> bool {
    matches!(log.event, DomainEvent::Approval { .. })
}

/// The three downstream views of one classified batch.
#[derive(Debug, Clone, Default)]
pub struct LogStreams {
    /// Router swaps, pass-through history.
    pub swap_logs: Vec<ClassifiedLog>,
    /// Plain ERC-20 transfers; also the token discovery source.
    pub transfer_logs: Vec<ClassifiedLog>,
    /// Everything the balance reducer consumes.
    pub bna_logs: Vec<ClassifiedLog>,
}

pub fn split_streams(config: &ResourceConfig, logs: &[ClassifiedLog]) -> LogStreams {
    let mut streams = LogStreams::default();
    for log in logs {
        if is_swap_log(config, log) {
            streams.swap_logs.push(log.clone());
        }
        if is_erc20_transfer_log(log) {
            streams.transfer_logs.push(log.clone());
        }
        if is_erc20_transfer_log(log)
            || is_erc20_approval_log(log)
            || is_position_log(config, log)
        {
            streams.bna_logs.push(log.clone());
        }
    }
    streams
}
