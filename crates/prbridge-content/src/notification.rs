use std::time::{Duration, Instant};

use prbridge_dom::{Document, NodeId};
use prbridge_types::{Notification, NotificationKind};
use tracing::debug;

use crate::error::Result;

pub const NOTIFICATION_ID: &str = "prbridge-notification";
pub const DISPLAY_DURATION: Duration = Duration::from_secs(5);

const CLOSE_CLASS: &str = "prbridge-notification-close";

fn title(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Error => "Error",
        NotificationKind::Warning => "Warning",
        NotificationKind::Success => "Success",
        NotificationKind::Info => "prbridge",
    }
}

fn icon(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Error => "\u{26a0}\u{fe0f}",
        NotificationKind::Warning => "\u{26a1}",
        NotificationKind::Success => "\u{2713}",
        NotificationKind::Info => "\u{2139}\u{fe0f}",
    }
}

fn background(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Error => "#ef4444",
        NotificationKind::Warning => "#f59e0b",
        NotificationKind::Success => "#10b981",
        NotificationKind::Info => "#3b82f6",
    }
}

#[derive(Debug, Clone, Copy)]
struct Toast {
    node: NodeId,
    close: NodeId,
    expires_at: Instant,
}

/// Renders at most one toast at a time into the page body.
#[derive(Debug)]
pub struct NotificationPresenter {
    duration: Duration,
    current: Option<Toast>,
}

impl NotificationPresenter {
    pub fn new() -> Self {
        Self::with_duration(DISPLAY_DURATION)
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
        }
    }

    /// Shows `notification`, replacing whatever toast is on the page.
    pub fn show(
        &mut self,
        doc: &mut Document,
        notification: &Notification,
        now: Instant,
    ) -> Result<NodeId> {
        if let Some(existing) = doc.query_selector(doc.root(), &format!("#{NOTIFICATION_ID}"))? {
            doc.remove(existing)?;
        }

        let kind = notification.kind;
        let toast = doc.create_element("div");
        doc.set_attr(toast, "id", NOTIFICATION_ID)?;
        doc.set_attr(toast, "role", "alert")?;
        doc.set_attr(toast, "data-kind", kind.as_str())?;
        doc.set_attr(
            toast,
            "style",
            &format!(
                "position: fixed; top: 20px; right: 20px; max-width: 400px; padding: 16px 20px; \
                 background: {}; color: white; border-radius: 8px; z-index: 999999; font-size: 14px;",
                background(kind)
            ),
        )?;

        let icon_el = doc.create_element("span");
        doc.add_class(icon_el, "prbridge-notification-icon")?;
        let icon_text = doc.create_text(icon(kind));
        doc.append_child(icon_el, icon_text)?;
        doc.append_child(toast, icon_el)?;

        let body = doc.create_element("div");
        let heading = doc.create_element("strong");
        let heading_text = doc.create_text(title(kind));
        doc.append_child(heading, heading_text)?;
        doc.append_child(body, heading)?;
        let message = doc.create_element("div");
        let message_text = doc.create_text(&notification.message);
        doc.append_child(message, message_text)?;
        doc.append_child(body, message)?;
        doc.append_child(toast, body)?;

        let close = doc.create_element("button");
        doc.set_attr(close, "type", "button")?;
        doc.add_class(close, CLOSE_CLASS)?;
        let close_text = doc.create_text("\u{d7}");
        doc.append_child(close, close_text)?;
        doc.append_child(toast, close)?;

        let parent = doc.body();
        doc.append_child(parent, toast)?;
        debug!(kind = kind.as_str(), message = %notification.message, "notification shown");

        self.current = Some(Toast {
            node: toast,
            close,
            expires_at: now + self.duration,
        });
        Ok(toast)
    }

    /// The toast currently managed by this presenter, if still on the page.
    pub fn current(&self, doc: &Document) -> Option<NodeId> {
        self.current
            .map(|t| t.node)
            .filter(|node| doc.is_connected(*node))
    }

    pub fn close_control(&self) -> Option<NodeId> {
        self.current.map(|t| t.close)
    }

    /// Removes the toast when its display time has passed.
    pub fn tick(&mut self, doc: &mut Document, now: Instant) -> Result<bool> {
        match self.current {
            Some(toast) if now >= toast.expires_at => self.dismiss(doc),
            _ => Ok(false),
        }
    }

    pub fn dismiss(&mut self, doc: &mut Document) -> Result<bool> {
        let Some(toast) = self.current.take() else {
            return Ok(false);
        };
        if !doc.is_connected(toast.node) {
            return Ok(false);
        }
        doc.remove(toast.node)?;
        Ok(true)
    }
}

impl Default for NotificationPresenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Document {
        Document::parse("<html><body><main>page</main></body></html>")
    }

    #[test]
    fn renders_toast_into_body() {
        let mut doc = page();
        let mut presenter = NotificationPresenter::new();
        let toast = presenter
            .show(&mut doc, &Notification::error("Server down <b>now</b>"), Instant::now())
            .unwrap();

        assert_eq!(doc.parent(toast), Some(doc.body()));
        assert_eq!(doc.attr(toast, "data-kind"), Some("error"));
        let text = doc.text_content(toast);
        assert!(text.contains("Error"));
        assert!(text.contains("Server down <b>now</b>"));
        assert!(doc.query_selector(toast, "b").unwrap().is_none());
    }

    #[test]
    fn info_uses_product_title() {
        let mut doc = page();
        let mut presenter = NotificationPresenter::new();
        let toast = presenter
            .show(&mut doc, &Notification::info("hello"), Instant::now())
            .unwrap();
        assert!(doc.text_content(toast).contains("prbridge"));
    }

    #[test]
    fn replaces_existing_toast() {
        let mut doc = page();
        let mut presenter = NotificationPresenter::new();
        let now = Instant::now();
        presenter.show(&mut doc, &Notification::info("one"), now).unwrap();
        presenter.show(&mut doc, &Notification::success("two"), now).unwrap();

        let toasts = doc
            .query_selector_all(doc.root(), "#prbridge-notification")
            .unwrap();
        assert_eq!(toasts.len(), 1);
        assert!(doc.text_content(toasts[0]).contains("two"));
    }

    #[test]
    fn expires_after_display_duration() {
        let mut doc = page();
        let mut presenter = NotificationPresenter::new();
        let start = Instant::now();
        presenter.show(&mut doc, &Notification::warning("careful"), start).unwrap();

        assert!(!presenter.tick(&mut doc, start + Duration::from_secs(4)).unwrap());
        assert!(presenter.current(&doc).is_some());
        assert!(presenter.tick(&mut doc, start + DISPLAY_DURATION).unwrap());
        assert!(presenter.current(&doc).is_none());
        assert!(doc
            .query_selector(doc.root(), "#prbridge-notification")
            .unwrap()
            .is_none());
    }

    #[test]
    fn dismiss_is_immediate_and_repeatable() {
        let mut doc = page();
        let mut presenter = NotificationPresenter::new();
        presenter.show(&mut doc, &Notification::info("x"), Instant::now()).unwrap();
        assert!(presenter.close_control().is_some());
        assert!(presenter.dismiss(&mut doc).unwrap());
        assert!(!presenter.dismiss(&mut doc).unwrap());
    }
}
