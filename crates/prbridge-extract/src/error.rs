use prbridge_dom::{DomError, SelectorError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
