pub mod bus;
pub mod host;
pub mod id;

pub use bus::{BusError, MessageBus, RuntimeEnvelope, Sender};
pub use host::ExtensionHost;
pub use id::TabId;
