mod config;
mod error;
mod inbound_loop;
mod outbound_loop;
mod queue;
mod resolver_pool;
mod supervisor;
mod traits;

pub use config::*;
pub use error::*;
pub use inbound_loop::*;
pub use outbound_loop::*;
pub use queue::*;
pub use resolver_pool::*;
pub use supervisor::*;
pub use traits::*;
