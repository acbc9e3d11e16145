pub mod pool;
pub mod token;

pub use pool::*;
pub use token::*;
