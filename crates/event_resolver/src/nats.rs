mod demo_producer;
mod jetstream_source;
mod jetstream_writer;

pub use demo_producer::*;
pub use jetstream_source::*;
pub use jetstream_writer::*;
