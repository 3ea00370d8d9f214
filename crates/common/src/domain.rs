mod codec;
mod device;
mod device_management;
mod failed_event;
mod resolved_event;
mod result;
mod unresolved_event;

pub use codec::*;
pub use device::*;
pub use device_management::*;
pub use failed_event::*;
pub use resolved_event::*;
pub use result::*;
pub use unresolved_event::*;
