use alloy_primitives::{Address, I256, U256};
use resource_core::types::{AccountResource, ClassifiedLog, DomainEvent, Pool, TokenKey};
use resource_core::ResourceConfig;
use std::collections::BTreeMap;
use tracing::warn;

fn key_from_token_id(id: U256) -> TokenKey {
    let (side, pool) = resource_core::types::unpack_position_id(id);
    TokenKey::Position(pool, side)
}

fn credit(balances: &mut std::collections::HashMap<TokenKey, I256>, key: TokenKey, value: U256) {
    let delta = I256::try_from(value).unwrap_or(I256::MAX);
    *balances.entry(key).or_insert(I256::ZERO) += delta;
}

fn debit(balances: &mut std::collections::HashMap<TokenKey, I256>, key: TokenKey, value: U256) {
    let delta = I256::try_from(value).unwrap_or(I256::MAX);
    *balances.entry(key).or_insert(I256::ZERO) -= delta;
}

/// Replay an account's balance-and-allowance log stream into its current
/// holdings. Logs must be chain-ordered; zero balances are pruned as they
/// occur so transient holdings leave no key behind.
pub fn reduce_account(
    config: &ResourceConfig,
    logs: &[ClassifiedLog],
    account: Address,
    pools: &BTreeMap<Address, Pool>,
) -> AccountResource {
    let mut res = AccountResource::default();

    for log in logs {
        match &log.event {
            DomainEvent::Transfer {
                token, from, to, value,
            } => {
                let key = TokenKey::Erc20(*token);
                if *to == account {
                    credit(&mut res.balances, key, *value);
                }
                if *from == account {
                    debit(&mut res.balances, key, *value);
                }
                if res.balance(&key).is_zero() {
                    res.balances.remove(&key);
                }
            }
            DomainEvent::Approval {
                token,
                owner,
                spender,
                value,
            } => {
                if *owner == account && *spender == config.router {
                    let key = TokenKey::Erc20(*token);
                    if value.is_zero() {
                        res.allowances.remove(&key);
                    } else {
                        res.allowances.insert(key, *value);
                    }
                }
            }
            DomainEvent::TransferSingle {
                from, to, id, value, ..
            } if log.raw.address == config.position_token => {
                apply_position_transfer(&mut res, account, *from, *to, *id, *value, log.raw.timestamp);
            }
            DomainEvent::TransferBatch {
                from, to, ids, values, ..
            } if log.raw.address == config.position_token => {
                if ids.len() != values.len() {
                    warn!(
                        tx = %log.raw.transaction_hash,
                        ids = ids.len(),
                        values = values.len(),
                        "TransferBatch length mismatch"
                    );
                }
                for (id, value) in ids.iter().zip(values.iter()) {
                    apply_position_transfer(&mut res, account, *from, *to, *id, *value, log.raw.timestamp);
                }
            }
            DomainEvent::ApprovalForAll {
                account: owner,
                operator,
                approved,
            } if log.raw.address == config.position_token => {
                if *owner == account && *operator == config.router && !approved {
                    res.allowances
                        .retain(|key, _| !matches!(key, TokenKey::Position(_, _)));
                }
            }
            _ => {}
        }
    }

    // Positions unlock a fixed duration after the last receipt; resolve the
    // absolute unlock time now that the pool configs are known.
    for key in res.balances.keys() {
        let TokenKey::Position(pool_address, _) = key else {
            continue;
        };
        let Some(pool) = pools.get(pool_address) else {
            continue;
        };
        if pool.maturity > 0 {
            let received_at = res.maturities.get(key).copied().unwrap_or(0);
            res.maturities.insert(*key, pool.maturity + received_at);
        }
    }

    res
}

fn apply_position_transfer(
    res: &mut AccountResource,
    account: Address,
    from: Address,
    to: Address,
    id: U256,
    value: U256,
    timestamp: u64,
) {
    let key = key_from_token_id(id);
    // the shared position token is router-managed
    res.allowances.insert(key, U256::MAX);
    if to == account {
        credit(&mut res.balances, key, value);
        res.maturities.insert(key, timestamp);
    }
    if from == account {
        debit(&mut res.balances, key, value);
        if res.balance(&key).is_zero() {
            res.balances.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use alloy_primitives::{Bytes, B256};
    use alloy_sol_types::{SolEvent, SolValue};
    use resource_core::events::{Approval, Transfer, TransferSingle};
    use resource_core::types::{pack_position_id, Side};

    fn config() -> ResourceConfig {
        ResourceConfig {
            chain_id: 1,
            rpc_url: String::new(),
            position_token: Address::repeat_byte(0x11),
            start_block: 0,
            pool_deployer: Address::ZERO,
            router: Address::repeat_byte(0x22),
            play_token: Address::ZERO,
            logic: Address::ZERO,
            logic_bytecode: Bytes::new(),
            token_info_lens: Address::ZERO,
            token_info_bytecode: Bytes::new(),
            fetchers: Default::default(),
            whitelist_pools: vec![],
            whitelist_tokens: vec![],
            stablecoins: vec![],
            route_tokens: vec![],
        }
    }

    fn topic_address(a: Address) -> B256 {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(a.as_slice());
        B256::from(word)
    }

    fn raw(
        address: Address,
        block: u64,
        timestamp: u64,
        topics: Vec<B256>,
        data: Bytes,
    ) -> resource_core::types::RawLog {
        resource_core::types::RawLog {
            address,
            topics,
            data,
            block_number: block,
            log_index: 0,
            transaction_hash: B256::with_last_byte(block as u8),
            timestamp,
        }
    }

    fn erc20_transfer(token: Address, from: Address, to: Address, value: u64, block: u64) -> ClassifiedLog {
        classify(&raw(
            token,
            block,
            0,
            vec![Transfer::SIGNATURE_HASH, topic_address(from), topic_address(to)],
            U256::from(value).abi_encode().into(),
        ))
    }

    fn erc20_approval(token: Address, owner: Address, spender: Address, value: u64, block: u64) -> ClassifiedLog {
        classify(&raw(
            token,
            block,
            0,
            vec![Approval::SIGNATURE_HASH, topic_address(owner), topic_address(spender)],
            U256::from(value).abi_encode().into(),
        ))
    }

    fn position_transfer(
        cfg: &ResourceConfig,
        from: Address,
        to: Address,
        id: U256,
        value: u64,
        block: u64,
        timestamp: u64,
    ) -> ClassifiedLog {
        classify(&raw(
            cfg.position_token,
            block,
            timestamp,
            vec![
                TransferSingle::SIGNATURE_HASH,
                topic_address(Address::ZERO),
                topic_address(from),
                topic_address(to),
            ],
            (id, U256::from(value)).abi_encode().into(),
        ))
    }

    fn no_pools() -> BTreeMap<Address, Pool> {
        BTreeMap::new()
    }

    #[test]
    fn transfers_conserve_value_between_accounts() {
        let cfg = config();
        let token = Address::repeat_byte(3);
        let alice = Address::repeat_byte(0xaa);
        let bob = Address::repeat_byte(0xbb);
        let logs = vec![
            erc20_transfer(token, Address::ZERO, alice, 1000, 1),
            erc20_transfer(token, alice, bob, 400, 2),
        ];

        let a = reduce_account(&cfg, &logs, alice, &no_pools());
        let b = reduce_account(&cfg, &logs, bob, &no_pools());
        let key = TokenKey::Erc20(token);
        assert_eq!(a.balance(&key), I256::try_from(600).unwrap());
        assert_eq!(b.balance(&key), I256::try_from(400).unwrap());
        assert_eq!(a.balance(&key) + b.balance(&key), I256::try_from(1000).unwrap());
    }

    #[test]
    fn zero_balances_are_pruned() {
        let cfg = config();
        let token = Address::repeat_byte(3);
        let alice = Address::repeat_byte(0xaa);
        let logs = vec![
            erc20_transfer(token, Address::ZERO, alice, 50, 1),
            erc20_transfer(token, alice, Address::ZERO, 50, 2),
        ];
        let res = reduce_account(&cfg, &logs, alice, &no_pools());
        assert!(res.balances.is_empty());
    }

    #[test]
    fn approval_tracks_latest_and_revocation_removes() {
        let cfg = config();
        let token = Address::repeat_byte(3);
        let alice = Address::repeat_byte(0xaa);
        let key = TokenKey::Erc20(token);

        let logs = vec![
            erc20_approval(token, alice, cfg.router, 700, 1),
            erc20_approval(token, alice, cfg.router, 900, 2),
        ];
        let res = reduce_account(&cfg, &logs, alice, &no_pools());
        assert_eq!(res.allowance(&key), U256::from(900));

        let logs = vec![
            erc20_approval(token, alice, cfg.router, 700, 1),
            erc20_approval(token, alice, cfg.router, 0, 2),
        ];
        let res = reduce_account(&cfg, &logs, alice, &no_pools());
        assert!(res.allowances.is_empty());
    }

    #[test]
    fn approvals_to_other_spenders_are_ignored() {
        let cfg = config();
        let token = Address::repeat_byte(3);
        let alice = Address::repeat_byte(0xaa);
        let logs = vec![erc20_approval(token, alice, Address::repeat_byte(0x99), 700, 1)];
        let res = reduce_account(&cfg, &logs, alice, &no_pools());
        assert!(res.allowances.is_empty());
    }

    #[test]
    fn position_receipt_records_balance_allowance_and_timestamp() {
        let cfg = config();
        let alice = Address::repeat_byte(0xaa);
        let pool = Address::repeat_byte(0x44);
        let id = pack_position_id(Side::Long, pool);
        let logs = vec![position_transfer(&cfg, Address::ZERO, alice, id, 9, 10, 1_700_000_000)];

        let res = reduce_account(&cfg, &logs, alice, &no_pools());
        let key = TokenKey::Position(pool, Side::Long.id());
        assert_eq!(res.balance(&key), I256::try_from(9).unwrap());
        assert_eq!(res.allowance(&key), U256::MAX);
        assert_eq!(res.maturity(&key), 1_700_000_000);
    }

    #[test]
    fn maturity_adds_pool_lock_duration() {
        let cfg = config();
        let alice = Address::repeat_byte(0xaa);
        let pool_address = Address::repeat_byte(0x44);
        let id = pack_position_id(Side::Short, pool_address);
        let logs = vec![position_transfer(&cfg, Address::ZERO, alice, id, 9, 10, 1_000)];

        let mut pools = BTreeMap::new();
        pools.insert(
            pool_address,
            Pool {
                address: pool_address,
                maturity: 60,
                ..Default::default()
            },
        );

        let res = reduce_account(&cfg, &logs, alice, &pools);
        let key = TokenKey::Position(pool_address, Side::Short.id());
        assert_eq!(res.maturity(&key), 1_060);
    }

    #[test]
    fn full_position_exit_prunes_balance() {
        let cfg = config();
        let alice = Address::repeat_byte(0xaa);
        let pool = Address::repeat_byte(0x44);
        let id = pack_position_id(Side::Long, pool);
        let logs = vec![
            position_transfer(&cfg, Address::ZERO, alice, id, 9, 10, 100),
            position_transfer(&cfg, alice, Address::ZERO, id, 9, 11, 200),
        ];
        let res = reduce_account(&cfg, &logs, alice, &no_pools());
        assert!(res.balances.is_empty());
    }
}
