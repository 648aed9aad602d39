use std::sync::Arc;

use prbridge_core::id::request_id;
use prbridge_core::{ExtensionHost, RuntimeEnvelope, Sender};
use prbridge_storage::RepositoryStore;
use prbridge_types::{ActionIntent, Notification};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn, Instrument};

use crate::client::AutomationClient;
use crate::error::RouterError;
use crate::mapping::{build_payload, find_mapping};

/// What a successful request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    FileOpened,
    CommentSent,
}

impl Delivery {
    pub fn message(&self) -> &'static str {
        match self {
            Self::FileOpened => "File opened in editor!",
            Self::CommentSent => "Comment sent to editor!",
        }
    }
}

pub struct MessageRouter {
    store: Arc<dyn RepositoryStore>,
    client: AutomationClient,
    host: Arc<dyn ExtensionHost>,
}

impl MessageRouter {
    pub fn new(
        store: Arc<dyn RepositoryStore>,
        client: AutomationClient,
        host: Arc<dyn ExtensionHost>,
    ) -> Self {
        Self {
            store,
            client,
            host,
        }
    }

    /// Loads the mapping table, matches the intent and delivers it.
    pub async fn handle(&self, intent: &ActionIntent) -> Result<Delivery, RouterError> {
        let repositories = self.store.load().await?;
        debug!(count = repositories.len(), "loaded repository mappings");

        let entry = find_mapping(&repositories, &intent.repo_url)
            .ok_or_else(|| RouterError::NotConfigured(intent.repo_url.clone()))?;
        info!(repo_url = %intent.repo_url, path = %entry.path, "matched repository mapping");

        let payload = build_payload(intent, entry);
        self.client.deliver(&payload).await?;

        Ok(if payload.is_file_open() {
            Delivery::FileOpened
        } else {
            Delivery::CommentSent
        })
    }

    /// Routes one runtime message and reports the outcome to the sending
    /// tab. Returns the notification produced, if any.
    pub async fn handle_envelope(&self, envelope: RuntimeEnvelope) -> Option<Notification> {
        let RuntimeEnvelope { sender, message } = envelope;
        let intent = message.into_intent()?;
        let span = tracing::info_span!("route", request = %request_id(), kind = %intent.kind);

        let notification = async {
            match self.handle(&intent).await {
                Ok(delivery) => {
                    info!(file_path = %intent.file_path, "request delivered");
                    Notification::success(delivery.message())
                }
                Err(e) => {
                    if e.is_delivery_failure() {
                        error!(error = %e, "delivery to automation server failed");
                    } else {
                        error!(error = %e, "request failed");
                    }
                    Notification::error(e.user_message())
                }
            }
        }
        .instrument(span)
        .await;

        self.notify(&sender, notification.clone()).await;
        Some(notification)
    }

    /// Consumes runtime messages until the channel closes. Each envelope is
    /// handled on its own task, so a request stuck on the automation server
    /// holds up only itself.
    pub async fn run(self: Arc<Self>, mut rx: broadcast::Receiver<RuntimeEnvelope>) {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    let router = Arc::clone(&self);
                    tokio::spawn(async move {
                        router.handle_envelope(envelope).await;
                    });
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "router fell behind; messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("runtime channel closed");
                    break;
                }
            }
        }
    }

    async fn notify(&self, sender: &Sender, notification: Notification) {
        let Some(tab_id) = &sender.tab_id else {
            return;
        };
        if let Err(e) = self.host.notify_page(tab_id, notification).await {
            warn!(tab = %tab_id, error = %e, "failed to notify page");
        }
    }
}
