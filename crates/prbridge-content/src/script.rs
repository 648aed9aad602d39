use std::sync::Arc;
use std::time::Instant;

use prbridge_core::{ExtensionHost, Sender, TabId};
use prbridge_dom::{Document, NodeId, PageLocation};
use prbridge_extract::{select, ExtractionStrategy, Platform};
use prbridge_types::{Notification, RuntimeMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::control::{ClickOutcome, ControlKind};
use crate::error::{ContentError, Result};
use crate::injector::{Injector, ReconcileReport};
use crate::notification::NotificationPresenter;
use crate::watcher::DomWatcher;

/// Upper bound on mutation batches handled by one settle.
const SETTLE_ROUNDS: usize = 16;

/// An injected control as seen from outside the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInfo {
    pub node: NodeId,
    pub kind: ControlKind,
    pub file_path: String,
}

/// Everything the extension runs inside one review page.
pub struct ContentScript {
    host: Arc<dyn ExtensionHost>,
    tab_id: TabId,
    inbox: mpsc::UnboundedReceiver<Notification>,
    location: PageLocation,
    document: Document,
    watcher: Option<DomWatcher>,
    presenter: NotificationPresenter,
}

impl ContentScript {
    /// Attaches to a page. An unsupported page yields an inert script that
    /// never injects and never notifies.
    pub fn new(
        host: Arc<dyn ExtensionHost>,
        tab_id: TabId,
        inbox: mpsc::UnboundedReceiver<Notification>,
        location: PageLocation,
        document: Document,
    ) -> Self {
        let watcher = match select(&location.origin()) {
            Some(strategy) => {
                info!(platform = %strategy.platform(), url = %location, "content script attached");
                Some(DomWatcher::new(Injector::new(strategy, location.clone())))
            }
            None => {
                warn!(host = location.hostname(), "no extraction strategy for this page");
                None
            }
        };
        Self {
            host,
            tab_id,
            inbox,
            location,
            document,
            watcher,
            presenter: NotificationPresenter::new(),
        }
    }

    pub fn load(
        host: Arc<dyn ExtensionHost>,
        tab_id: TabId,
        inbox: mpsc::UnboundedReceiver<Notification>,
        page_url: &str,
        html: &str,
    ) -> Result<Self> {
        let location = PageLocation::parse(page_url)?;
        Ok(Self::new(host, tab_id, inbox, location, Document::parse(html)))
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn platform(&self) -> Option<Platform> {
        self.watcher.as_ref().map(|w| w.injector().strategy().platform())
    }

    pub fn tab_id(&self) -> &TabId {
        &self.tab_id
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The page as mutated by its own scripts; call [`Self::on_mutations`]
    /// afterwards.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Starts the watcher and lets the page settle.
    pub fn start(&mut self, now: Instant) -> Option<ReconcileReport> {
        let watcher = self.watcher.as_mut()?;
        let report = watcher.observe(&mut self.document, &mut self.presenter, now);
        watcher.settle(&mut self.document, &mut self.presenter, now, SETTLE_ROUNDS);
        report
    }

    /// Reacts to page changes made since the last pass.
    pub fn on_mutations(&mut self, now: Instant) -> usize {
        match self.watcher.as_mut() {
            Some(watcher) => {
                watcher.settle(&mut self.document, &mut self.presenter, now, SETTLE_ROUNDS)
            }
            None => 0,
        }
    }

    pub fn stop(&mut self) {
        if let Some(watcher) = self.watcher.as_mut() {
            watcher.disconnect();
        }
    }

    pub fn controls(&self) -> Vec<ControlInfo> {
        let Some(watcher) = self.watcher.as_ref() else {
            return Vec::new();
        };
        watcher
            .injector()
            .controls(&self.document)
            .into_iter()
            .map(|(node, binding)| ControlInfo {
                node,
                kind: binding.kind,
                file_path: binding.file_path.clone(),
            })
            .collect()
    }

    /// Clicks a control. Intents are forwarded to the background; alerts are
    /// returned to the caller to show.
    pub async fn click(&mut self, control: NodeId, now: Instant) -> Result<ClickOutcome> {
        let watcher = self.watcher.as_ref().ok_or(ContentError::Unsupported)?;
        let outcome = watcher.injector().click(&self.document, control)?;

        match &outcome {
            ClickOutcome::Send(intent) => {
                info!(
                    kind = %intent.kind,
                    file_path = %intent.file_path,
                    repo_url = %intent.repo_url,
                    "sending intent"
                );
                let message = RuntimeMessage::Intent(intent.clone());
                if let Err(e) = self
                    .host
                    .send_message(Sender::tab(self.tab_id.clone()), message)
                    .await
                {
                    error!(error = %e, "failed to reach background");
                    let notification = Notification::error(format!("Extension error: {}", e));
                    self.presenter.show(&mut self.document, &notification, now)?;
                    return Err(e.into());
                }
            }
            ClickOutcome::Alert(message) => warn!(alert = %message, "action aborted"),
        }
        Ok(outcome)
    }

    /// Renders a notification sent by the background.
    pub fn present(&mut self, notification: &Notification, now: Instant) -> Result<NodeId> {
        self.presenter.show(&mut self.document, notification, now)
    }

    /// Waits for the next notification from the background and renders it.
    /// `None` once the tab's channel is closed.
    pub async fn next_notification(&mut self, now: Instant) -> Option<Notification> {
        let notification = self.inbox.recv().await?;
        if let Err(e) = self.present(&notification, now) {
            error!(error = %e, "failed to show notification");
        }
        Some(notification)
    }

    /// Renders every notification already queued for this tab.
    pub fn drain_notifications(&mut self, now: Instant) -> Vec<Notification> {
        let mut received = Vec::new();
        while let Ok(notification) = self.inbox.try_recv() {
            if let Err(e) = self.present(&notification, now) {
                error!(error = %e, "failed to show notification");
            }
            received.push(notification);
        }
        received
    }

    /// Current toast, if one is showing.
    pub fn notification(&self) -> Option<NodeId> {
        self.presenter.current(&self.document)
    }

    pub fn dismiss_notification(&mut self) -> Result<bool> {
        self.presenter.dismiss(&mut self.document)
    }

    /// Expires the toast once its display time is over.
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        self.presenter.tick(&mut self.document, now)
    }
}
