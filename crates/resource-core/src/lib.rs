pub mod config;
pub mod error;
pub mod events;
pub mod math;
pub mod types;

pub use config::{EnvConfig, ProfileConfig, ResourceConfig};
pub use error::{ResourceError, Result};
