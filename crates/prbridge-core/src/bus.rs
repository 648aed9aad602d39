use dashmap::DashMap;
use prbridge_types::{Notification, RuntimeMessage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use crate::id::TabId;

/// Who posted a runtime message. Messages from outside any page (the CLI,
/// tests) carry no tab and therefore receive no notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub tab_id: Option<TabId>,
}

impl Sender {
    pub fn tab(tab_id: TabId) -> Self {
        Self {
            tab_id: Some(tab_id),
        }
    }

    pub fn detached() -> Self {
        Self { tab_id: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeEnvelope {
    pub sender: Sender,
    pub message: RuntimeMessage,
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("No background listener is attached to the runtime channel")]
    NoListener,

    #[error("Unknown tab: {0}")]
    UnknownTab(TabId),

    #[error("Tab closed: {0}")]
    TabClosed(TabId),
}

/// Page <-> background transport.
///
/// Runtime messages fan out to every background subscriber; notifications go
/// to exactly one registered tab.
pub struct MessageBus {
    runtime_tx: broadcast::Sender<RuntimeEnvelope>,
    tabs: DashMap<TabId, mpsc::UnboundedSender<Notification>>,
}

impl MessageBus {
    pub fn new() -> Self {
        let (runtime_tx, _) = broadcast::channel(1024);
        Self {
            runtime_tx,
            tabs: DashMap::new(),
        }
    }

    pub fn subscribe_runtime(&self) -> broadcast::Receiver<RuntimeEnvelope> {
        self.runtime_tx.subscribe()
    }

    pub fn register_tab(&self) -> (TabId, mpsc::UnboundedReceiver<Notification>) {
        let tab_id = TabId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.tabs.insert(tab_id.clone(), tx);
        tracing::debug!(tab = %tab_id, "registered tab");
        (tab_id, rx)
    }

    pub fn unregister_tab(&self, tab_id: &TabId) {
        if self.tabs.remove(tab_id).is_some() {
            tracing::debug!(tab = %tab_id, "unregistered tab");
        }
    }

    pub fn post(&self, sender: Sender, message: RuntimeMessage) -> Result<usize, BusError> {
        tracing::debug!(message_type = message.type_name(), "posting runtime message");
        self.runtime_tx
            .send(RuntimeEnvelope { sender, message })
            .map_err(|_| BusError::NoListener)
    }

    pub fn deliver(&self, tab_id: &TabId, notification: Notification) -> Result<(), BusError> {
        let tx = self
            .tabs
            .get(tab_id)
            .ok_or_else(|| BusError::UnknownTab(tab_id.clone()))?;
        tx.send(notification)
            .map_err(|_| BusError::TabClosed(tab_id.clone()))
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prbridge_types::ActionIntent;

    #[tokio::test]
    async fn post_reaches_runtime_subscriber() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe_runtime();
        let (tab, _notifications) = bus.register_tab();

        let intent = ActionIntent::open_file("a/b.rs", "https://github.com/o/r");
        bus.post(Sender::tab(tab.clone()), intent.clone().into())
            .unwrap();

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.sender.tab_id, Some(tab));
        assert_eq!(envelope.message.into_intent(), Some(intent));
    }

    #[test]
    fn post_without_listener_fails() {
        let bus = MessageBus::new();
        let result = bus.post(Sender::detached(), Notification::info("x").into());
        assert!(matches!(result, Err(BusError::NoListener)));
    }

    #[tokio::test]
    async fn deliver_targets_one_tab() {
        let bus = MessageBus::new();
        let (first, mut first_rx) = bus.register_tab();
        let (_second, mut second_rx) = bus.register_tab();

        bus.deliver(&first, Notification::success("done")).unwrap();

        assert_eq!(first_rx.recv().await, Some(Notification::success("done")));
        assert!(second_rx.try_recv().is_err());
    }

    #[test]
    fn deliver_to_unknown_or_closed_tab_fails() {
        let bus = MessageBus::new();
        let stranger = TabId::new();
        assert!(matches!(
            bus.deliver(&stranger, Notification::info("x")),
            Err(BusError::UnknownTab(_))
        ));

        let (tab, rx) = bus.register_tab();
        drop(rx);
        assert!(matches!(
            bus.deliver(&tab, Notification::info("x")),
            Err(BusError::TabClosed(_))
        ));

        bus.unregister_tab(&tab);
        assert!(matches!(
            bus.deliver(&tab, Notification::info("x")),
            Err(BusError::UnknownTab(_))
        ));
    }
}
