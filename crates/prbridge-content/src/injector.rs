use std::collections::HashMap;

use prbridge_dom::{Document, NodeId, PageLocation};
use prbridge_extract::{
    sanitize_comment, ExtractionStrategy, InstructionBlock, Placement, Strategy,
};
use prbridge_types::ActionIntent;
use tracing::{debug, info, warn};

use crate::control::{create_control, Binding, ClickOutcome, ControlKind, AI_PROMPT_MARKER};
use crate::error::{ContentError, Result};

const NO_CONTAINER: &str = "Could not find code block container.";
const NO_CODE_BLOCK: &str = "No code block found to execute.";

/// Code blocks an execute control may run.
const EXECUTABLE_CODE: &str = "pre code, pre.hljs code";

/// Controls added by one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub resolve: usize,
    pub execute: usize,
    pub open_file: usize,
    /// Threads (or prompt summaries) left without a control because no file
    /// path could be found.
    pub skipped: usize,
}

impl ReconcileReport {
    pub fn added(&self) -> usize {
        self.resolve + self.execute + self.open_file
    }
}

/// Converges a page to "every eligible thread has exactly one control of each
/// applicable kind". Safe to run any number of times.
pub struct Injector {
    strategy: Strategy,
    location: PageLocation,
    bindings: HashMap<NodeId, Binding>,
    /// Error returned by the next reconcile pass instead of running it.
    #[cfg(test)]
    pub(crate) fail_next: Option<ContentError>,
}

impl Injector {
    pub fn new(strategy: Strategy, location: PageLocation) -> Self {
        Self {
            strategy,
            location,
            bindings: HashMap::new(),
            #[cfg(test)]
            fail_next: None,
        }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn binding(&self, control: NodeId) -> Option<&Binding> {
        self.bindings.get(&control)
    }

    /// Bound controls still attached to the page, in document order.
    pub fn controls(&self, doc: &Document) -> Vec<(NodeId, &Binding)> {
        doc.descendants(doc.root())
            .into_iter()
            .filter_map(|id| self.bindings.get(&id).map(|b| (id, b)))
            .collect()
    }

    pub fn reconcile(&mut self, doc: &mut Document) -> Result<ReconcileReport> {
        #[cfg(test)]
        {
            if let Some(e) = self.fail_next.take() {
                return Err(e);
            }
        }

        let selectors = self.strategy.selectors();
        let mut report = ReconcileReport::default();

        let before = self.bindings.len();
        self.bindings.retain(|control, _| doc.is_connected(*control));
        if self.bindings.len() < before {
            debug!(dropped = before - self.bindings.len(), "forgot detached controls");
        }

        let threads = doc.query_selector_all(doc.root(), selectors.thread)?;
        debug!(
            platform = %self.strategy.platform(),
            threads = threads.len(),
            "reconciling comment threads"
        );

        for thread in threads {
            let Some(content) = doc.query_selector(thread, selectors.content)? else {
                continue;
            };
            let mut file_path: Option<String> = None;

            if doc
                .query_selector(thread, &ControlKind::Resolve.marker_selector())?
                .is_none()
            {
                let path = self.thread_path(doc, thread, &mut file_path)?;
                if path.is_empty() {
                    debug!(thread = %thread, "skipping thread without a file path");
                    report.skipped += 1;
                } else if let Some(actions) = doc.query_selector(thread, selectors.actions)? {
                    let button = create_control(doc, ControlKind::Resolve, &path)?;
                    doc.append_child(actions, button)?;
                    self.bind(
                        button,
                        Binding {
                            kind: ControlKind::Resolve,
                            file_path: path,
                            thread: Some(thread),
                            content: Some(content),
                            summary: None,
                        },
                    );
                    report.resolve += 1;
                } else {
                    warn!(thread = %thread, selector = selectors.actions, "no actions region for thread");
                }
            }

            for summary in doc.query_selector_all(thread, "summary")? {
                if !doc.text_content(summary).contains(AI_PROMPT_MARKER) {
                    continue;
                }
                if doc
                    .query_selector(summary, &ControlKind::Execute.marker_selector())?
                    .is_some()
                {
                    continue;
                }
                let path = self.thread_path(doc, thread, &mut file_path)?;
                if path.is_empty() {
                    debug!(thread = %thread, summary = %summary, "skipping prompt without a file path");
                    report.skipped += 1;
                    continue;
                }
                let button = create_control(doc, ControlKind::Execute, &path)?;
                doc.append_child(summary, button)?;
                self.bind(
                    button,
                    Binding {
                        kind: ControlKind::Execute,
                        file_path: path,
                        thread: Some(thread),
                        content: Some(content),
                        summary: Some(summary),
                    },
                );
                report.execute += 1;
            }
        }

        for target in self.strategy.open_file_targets(doc)? {
            let kind = if target.inline {
                ControlKind::OpenFileInline
            } else {
                ControlKind::OpenFile
            };
            if doc
                .query_selector(target.scope, &kind.marker_selector())?
                .is_some()
            {
                continue;
            }
            let button = create_control(doc, kind, &target.file_path)?;
            match target.placement {
                Placement::Append => doc.append_child(target.anchor, button)?,
                Placement::After => doc.insert_after(target.anchor, button)?,
            }
            self.bind(
                button,
                Binding {
                    kind,
                    file_path: target.file_path,
                    thread: None,
                    content: None,
                    summary: None,
                },
            );
            report.open_file += 1;
        }

        if report.added() > 0 {
            info!(
                resolve = report.resolve,
                execute = report.execute,
                open_file = report.open_file,
                "action controls added"
            );
        }
        Ok(report)
    }

    /// Turns a click on `control` into an intent, or an alert when there is
    /// nothing to send.
    pub fn click(&self, doc: &Document, control: NodeId) -> Result<ClickOutcome> {
        let binding = self
            .bindings
            .get(&control)
            .ok_or(ContentError::UnknownControl(control))?;
        let repo_url = self.strategy.resolve_repository_url(&self.location);

        match binding.kind {
            ControlKind::Resolve => {
                let (Some(thread), Some(content)) = (binding.thread, binding.content) else {
                    return Err(ContentError::UnknownControl(control));
                };
                let comment = sanitize_comment(doc, content)?;
                let snippet = self.strategy.extract_code_snippets(doc, thread)?;
                Ok(ClickOutcome::Send(ActionIntent::resolve(
                    comment,
                    snippet,
                    binding.file_path.clone(),
                    repo_url,
                )))
            }
            ControlKind::Execute => {
                let Some(summary) = binding.summary else {
                    return Err(ContentError::UnknownControl(control));
                };
                self.execute(doc, summary, binding, repo_url)
            }
            ControlKind::OpenFile | ControlKind::OpenFileInline => Ok(ClickOutcome::Send(
                ActionIntent::open_file(binding.file_path.clone(), repo_url),
            )),
        }
    }

    /// Re-reads the instruction under `summary` at click time.
    fn execute(
        &self,
        doc: &Document,
        summary: NodeId,
        binding: &Binding,
        repo_url: String,
    ) -> Result<ClickOutcome> {
        let Some(details) = doc.closest(summary, "details")? else {
            warn!(summary = %summary, "execute control outside a details block");
            return Ok(ClickOutcome::Alert(NO_CONTAINER.to_string()));
        };
        let Some(code) = doc.query_selector(details, EXECUTABLE_CODE)? else {
            warn!(details = %details, "no code block to execute");
            return Ok(ClickOutcome::Alert(NO_CODE_BLOCK.to_string()));
        };

        let text = doc.text_content(code);
        let text = text.trim();
        let (body, file_path) = match InstructionBlock::parse(text) {
            Some(block) => {
                let path = block
                    .plausible_path()
                    .map(str::to_string)
                    .unwrap_or_else(|| binding.file_path.clone());
                (block.body, path)
            }
            None => (text.to_string(), binding.file_path.clone()),
        };

        if body.is_empty() {
            warn!(details = %details, "instruction block has no body");
            return Ok(ClickOutcome::Alert(NO_CODE_BLOCK.to_string()));
        }
        debug!(file_path = %file_path, "execute instruction extracted");
        Ok(ClickOutcome::Send(ActionIntent::execute(body, file_path, repo_url)))
    }

    fn bind(&mut self, control: NodeId, binding: Binding) {
        self.bindings.insert(control, binding);
    }

    /// Resolves the thread's path at most once per pass.
    fn thread_path(
        &self,
        doc: &Document,
        thread: NodeId,
        cached: &mut Option<String>,
    ) -> Result<String> {
        if let Some(path) = cached {
            return Ok(path.clone());
        }
        let path = self.strategy.locate_file_path(doc, thread)?;
        *cached = Some(path.clone());
        Ok(path)
    }
}
