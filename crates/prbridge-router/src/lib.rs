//! Background side of the bridge: matches intents against the repository
//! mapping table and delivers them to the local automation server.

pub mod client;
pub mod error;
pub mod mapping;
pub mod router;

pub use client::{AutomationClient, DEFAULT_SERVER_URL};
pub use error::RouterError;
pub use mapping::{build_payload, find_mapping};
pub use prbridge_types::normalize_repo_url;
pub use router::{Delivery, MessageRouter};
