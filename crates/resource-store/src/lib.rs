mod log_cache;
mod merger;
mod snapshot;

pub use log_cache::{FileKv, KeyValueStore, LogStore, MemoryKv};
pub use merger::{merge_sorted_unique, sort_and_dedup, ChainOrdered};
pub use snapshot::{ResourceSnapshot, ResourceStore};
