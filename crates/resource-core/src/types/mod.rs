pub mod account;
pub mod event;
pub mod log;
pub mod pair;
pub mod pool;
pub mod position;
pub mod token;

pub use account::*;
pub use event::*;
pub use log::*;
pub use pair::*;
pub use pool::*;
pub use position::*;
pub use token::*;
