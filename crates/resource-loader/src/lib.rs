pub mod calls;
pub mod executor;
pub mod log_source;
pub mod pairs;
pub mod pool_loader;

pub use executor::{BatchCallExecutor, BatchResponse, Call, CallGroup, RpcCallExecutor, StateOverrides};
pub use log_source::{account_topic_filters, LogFilter, LogSource, RpcLogSource, MAX_BLOCK};
pub use pairs::{AmmPairSource, PairInfoSource};
pub use pool_loader::{LoadedPools, PoolStateLoader};
