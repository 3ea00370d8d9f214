mod event_resolver;
mod in_memory_device_management;
mod payload_resolution;
mod resolution_outcome;

pub use event_resolver::*;
pub use in_memory_device_management::*;
pub use payload_resolution::*;
pub use resolution_outcome::*;
