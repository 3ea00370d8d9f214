pub mod domain;
pub mod nats;
pub mod proto;
pub mod telemetry;

pub use domain::*;
pub use nats::*;
pub use proto::*;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockDeviceManagement;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockEventCodec;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockJetStreamConsumer;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockJetStreamPublisher;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockMessageAcker;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockPullConsumer;
