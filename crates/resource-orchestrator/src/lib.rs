mod resource;
mod search;

pub use resource::Resource;
pub use search::{group_created_pools, search_filters, search_topic, CreatedPool, SearchResults};
