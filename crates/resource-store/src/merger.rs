use alloy_primitives::B256;
use resource_core::types::{ClassifiedLog, RawLog};

/// Anything that can be chain-ordered and deduplicated like a log.
pub trait ChainOrdered {
    fn ordering_key(&self) -> (u64, u64);
    fn identity(&self) -> (B256, u64);
}

impl ChainOrdered for RawLog {
    fn ordering_key(&self) -> (u64, u64) {
        self.ordering_key()
    }
    fn identity(&self) -> (B256, u64) {
        self.identity()
    }
}

impl ChainOrdered for ClassifiedLog {
    fn ordering_key(&self) -> (u64, u64) {
        self.ordering_key()
    }
    fn identity(&self) -> (B256, u64) {
        self.identity()
    }
}

/// Sort by (block, log index) and drop duplicate (tx hash, log index)
/// entries. Used to normalize raw fetch output before merging.
pub fn sort_and_dedup<T: ChainOrdered>(logs: &mut Vec<T>) {
    logs.sort_by_key(|l| l.ordering_key());
    logs.dedup_by(|a, b| a.identity() == b.identity());
}

/// Merge two chain-ordered, deduplicated streams into one. Entries present
/// in both (same tx hash and log index) appear once; merging a stream with
/// itself is the identity.
pub fn merge_sorted_unique<T: ChainOrdered + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (ka, kb) = (a[i].ordering_key(), b[j].ordering_key());
        if ka < kb {
            out.push(a[i].clone());
            i += 1;
        } else if kb < ka {
            out.push(b[j].clone());
            j += 1;
        } else if a[i].identity() == b[j].identity() {
            out.push(a[i].clone());
            i += 1;
            j += 1;
        } else {
            // same position, different tx: reorg artifact, keep both
            out.push(a[i].clone());
            i += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, B256};

    fn log(block: u64, index: u64, tx: u8) -> RawLog {
        RawLog {
            address: Address::ZERO,
            topics: vec![],
            data: Bytes::new(),
            block_number: block,
            log_index: index,
            transaction_hash: B256::repeat_byte(tx),
            timestamp: 0,
        }
    }

    #[test]
    fn merge_interleaves_and_dedups() {
        let a = vec![log(1, 0, 1), log(3, 2, 3), log(5, 0, 5)];
        let b = vec![log(2, 1, 2), log(3, 2, 3), log(6, 4, 6)];
        let merged = merge_sorted_unique(&a, &b);
        let blocks: Vec<u64> = merged.iter().map(|l| l.block_number).collect();
        assert_eq!(blocks, vec![1, 2, 3, 5, 6]);
    }

    #[test]
    fn merge_with_self_is_identity() {
        let a = vec![log(1, 0, 1), log(1, 3, 1), log(9, 0, 9)];
        assert_eq!(merge_sorted_unique(&a, &a), a);
    }

    #[test]
    fn remerging_a_source_stream_changes_nothing() {
        let a = vec![log(1, 0, 1), log(4, 2, 4), log(8, 0, 8)];
        let b = vec![log(2, 1, 2), log(4, 2, 4)];
        let merged = merge_sorted_unique(&a, &b);
        assert_eq!(merge_sorted_unique(&merged, &a), merged);
        assert_eq!(merge_sorted_unique(&merged, &b), merged);
    }

    #[test]
    fn merge_with_empty_preserves_stream() {
        let a = vec![log(4, 0, 4), log(7, 1, 7)];
        assert_eq!(merge_sorted_unique(&a, &[]), a);
        assert_eq!(merge_sorted_unique(&[], &a), a);
    }

    #[test]
    fn sort_and_dedup_normalizes_fetch_output() {
        let mut logs = vec![log(5, 1, 5), log(2, 0, 2), log(5, 1, 5), log(2, 3, 2)];
        sort_and_dedup(&mut logs);
        assert_eq!(
            logs.iter().map(|l| l.ordering_key()).collect::<Vec<_>>(),
            vec![(2, 0), (2, 3), (5, 1)]
        );
    }
}
