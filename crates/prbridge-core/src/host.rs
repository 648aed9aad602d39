use async_trait::async_trait;
use prbridge_types::{Notification, RuntimeMessage};

use crate::bus::{BusError, MessageBus, Sender};
use crate::id::TabId;

/// The extension-runtime facade handed to every component that talks across
/// the page/background boundary. Constructed once at startup and passed in
/// explicitly.
#[async_trait]
pub trait ExtensionHost: Send + Sync {
    async fn send_message(&self, sender: Sender, message: RuntimeMessage) -> Result<(), BusError>;

    async fn notify_page(&self, tab_id: &TabId, notification: Notification)
        -> Result<(), BusError>;
}

#[async_trait]
impl ExtensionHost for MessageBus {
    async fn send_message(&self, sender: Sender, message: RuntimeMessage) -> Result<(), BusError> {
        self.post(sender, message).map(|_| ())
    }

    async fn notify_page(
        &self,
        tab_id: &TabId,
        notification: Notification,
    ) -> Result<(), BusError> {
        self.deliver(tab_id, notification)
    }
}
