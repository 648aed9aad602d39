use std::time::Instant;

use prbridge_dom::Document;
use prbridge_types::Notification;
use tracing::{debug, error, warn};

use crate::injector::{Injector, ReconcileReport};
use crate::notification::NotificationPresenter;

/// Re-runs the injector whenever the page reports mutations.
///
/// A failing pass is logged and shown as a toast; the watcher stays
/// connected and tries again on the next batch.
pub struct DomWatcher {
    injector: Injector,
    connected: bool,
    passes: u64,
}

impl DomWatcher {
    pub fn new(injector: Injector) -> Self {
        Self {
            injector,
            connected: false,
            passes: 0,
        }
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of reconcile passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Starts observing and runs one pass right away.
    pub fn observe(
        &mut self,
        doc: &mut Document,
        presenter: &mut NotificationPresenter,
        now: Instant,
    ) -> Option<ReconcileReport> {
        self.connected = true;
        doc.take_records();
        self.pass(doc, presenter, now)
    }

    /// Drains the pending mutation batch and reconciles when it is non-empty.
    pub fn on_mutations(
        &mut self,
        doc: &mut Document,
        presenter: &mut NotificationPresenter,
        now: Instant,
    ) -> Option<ReconcileReport> {
        if !self.connected {
            return None;
        }
        let records = doc.take_records();
        if records.is_empty() {
            return None;
        }
        debug!(records = records.len(), "page mutated");
        self.pass(doc, presenter, now)
    }

    /// Handles mutation batches until the page is quiet or `max_rounds`
    /// batches were processed. Returns the number of batches handled.
    pub fn settle(
        &mut self,
        doc: &mut Document,
        presenter: &mut NotificationPresenter,
        now: Instant,
        max_rounds: usize,
    ) -> usize {
        let mut rounds = 0;
        while rounds < max_rounds && self.connected && doc.has_pending_records() {
            self.on_mutations(doc, presenter, now);
            rounds += 1;
        }
        if doc.has_pending_records() && self.connected {
            warn!(max_rounds, "page did not settle");
        }
        rounds
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    fn pass(
        &mut self,
        doc: &mut Document,
        presenter: &mut NotificationPresenter,
        now: Instant,
    ) -> Option<ReconcileReport> {
        self.passes += 1;
        match self.injector.reconcile(doc) {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "failed to add action buttons");
                let notification =
                    Notification::error(format!("Failed to add action buttons: {}", e));
                if let Err(e) = presenter.show(doc, &notification, now) {
                    error!(error = %e, "failed to show notification");
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentError;
    use prbridge_dom::PageLocation;
    use prbridge_extract::select;

    fn watcher() -> DomWatcher {
        let location = PageLocation::parse("https://github.com/acme/widgets/pull/1").unwrap();
        let strategy = select(&location.origin()).unwrap();
        DomWatcher::new(Injector::new(strategy, location))
    }

    const THREAD: &str = r#"<div class="timeline-comment-group"><div class="timeline-comment-actions"></div>
        <div class="comment-body"><pre><code>In src/a.rs
Fix</code></pre></div></div>"#;

    #[test]
    fn observe_runs_eager_pass() {
        let mut doc = Document::parse(&format!("<body>{THREAD}</body>"));
        let mut presenter = NotificationPresenter::new();
        let mut watcher = watcher();
        let report = watcher.observe(&mut doc, &mut presenter, Instant::now()).unwrap();
        assert_eq!(report.resolve, 1);
        assert!(watcher.is_connected());
    }

    #[test]
    fn streamed_threads_get_controls() {
        let mut doc = Document::parse("<body><div id=\"list\"></div></body>");
        let mut presenter = NotificationPresenter::new();
        let mut watcher = watcher();
        let now = Instant::now();
        watcher.observe(&mut doc, &mut presenter, now);

        // Content arrives after the first pass.
        let list = doc.query_selector(doc.root(), "#list").unwrap().unwrap();
        doc.append_html(list, THREAD).unwrap();

        let rounds = watcher.settle(&mut doc, &mut presenter, now, 8);
        assert!(rounds >= 1);
        assert!(!doc.has_pending_records());
        assert_eq!(
            doc.query_selector_all(doc.root(), ".resolve-in-editor-btn")
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn quiet_page_needs_no_pass() {
        let mut doc = Document::parse(&format!("<body>{THREAD}</body>"));
        let mut presenter = NotificationPresenter::new();
        let mut watcher = watcher();
        let now = Instant::now();
        watcher.observe(&mut doc, &mut presenter, now);
        watcher.settle(&mut doc, &mut presenter, now, 8);
        let passes = watcher.passes();
        assert!(watcher.on_mutations(&mut doc, &mut presenter, now).is_none());
        assert_eq!(watcher.passes(), passes);
    }

    #[test]
    fn failed_pass_shows_toast_and_keeps_observing() {
        let mut doc = Document::parse("<body><div id=\"list\"></div></body>");
        let mut presenter = NotificationPresenter::new();
        let mut watcher = watcher();
        watcher.injector.fail_next = Some(ContentError::Unsupported);
        let now = Instant::now();

        assert!(watcher.observe(&mut doc, &mut presenter, now).is_none());
        assert!(watcher.is_connected());
        let toast = presenter.current(&doc).unwrap();
        assert_eq!(doc.attr(toast, "data-kind"), Some("error"));
        assert!(doc
            .text_content(toast)
            .contains("Failed to add action buttons: Page is not supported"));

        let list = doc.query_selector(doc.root(), "#list").unwrap().unwrap();
        doc.append_html(list, THREAD).unwrap();
        watcher.settle(&mut doc, &mut presenter, now, 8);
        assert_eq!(
            doc.query_selector_all(doc.root(), ".resolve-in-editor-btn")
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn disconnected_watcher_ignores_mutations() {
        let mut doc = Document::parse("<body></body>");
        let mut presenter = NotificationPresenter::new();
        let mut watcher = watcher();
        let now = Instant::now();
        watcher.observe(&mut doc, &mut presenter, now);
        watcher.disconnect();

        let body = doc.body();
        let div = doc.create_element("div");
        doc.append_child(body, div).unwrap();
        assert!(watcher.on_mutations(&mut doc, &mut presenter, now).is_none());
        assert_eq!(watcher.settle(&mut doc, &mut presenter, now, 8), 0);
    }
}
