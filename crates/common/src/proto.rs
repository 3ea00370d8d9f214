mod codec;
mod event;
mod messages;

pub use codec::*;
pub use event::*;
pub use messages::*;
