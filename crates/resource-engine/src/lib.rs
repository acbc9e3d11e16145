pub mod analytics;
pub mod balances;
pub mod classifier;
pub mod positions;

pub use analytics::{calc_pool_info, get_rdc, get_rent_rate};
pub use balances::reduce_account;
pub use classifier::{classify, classify_logs, split_streams, LogStreams};
pub use positions::{calc_pool_side, pools_with_open_position, position_state, PoolSideInfo};
