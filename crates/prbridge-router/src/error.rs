use prbridge_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("No repository mapping found for {0}")]
    NotConfigured(String),

    #[error("Server error: {status} {reason}")]
    ServerStatus { status: u16, reason: String },

    #[error("{0}")]
    Unreachable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RouterError {
    /// Text shown on the page that sent the request.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConfigured(_) => {
                "Repository not configured. Add a mapping with `prbridge repo add`.".to_string()
            }
            Self::ServerStatus { .. } | Self::Unreachable(_) => {
                format!("Failed to send to editor: {}. Is the server running?", self)
            }
            Self::Storage(e) => format!("Extension error: {}", e),
        }
    }

    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, Self::ServerStatus { .. } | Self::Unreachable(_))
    }
}
