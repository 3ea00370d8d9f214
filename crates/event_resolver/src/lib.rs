pub mod domain;
pub mod nats;
pub mod pipeline;

pub use domain::*;
pub use nats::*;
pub use pipeline::*;
