use prbridge_core::BusError;
use prbridge_dom::{DomError, LocationError, NodeId, SelectorError};
use prbridge_extract::ExtractError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("No control bound to node {0}")]
    UnknownControl(NodeId),

    #[error("Page is not supported")]
    Unsupported,

    #[error("Message delivery failed: {0}")]
    Bus(#[from] BusError),
}

pub type Result<T> = std::result::Result<T, ContentError>;
