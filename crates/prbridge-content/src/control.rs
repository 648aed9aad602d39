use prbridge_dom::{Document, NodeId};
use prbridge_types::ActionIntent;

use crate::error::Result;

/// Summary text marking a collapsible block that holds an agent instruction.
pub const AI_PROMPT_MARKER: &str = "Prompt for AI Agents";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Resolve,
    Execute,
    OpenFile,
    OpenFileInline,
}

impl ControlKind {
    /// Class carried by every control of this kind; presence checks key on it.
    pub fn marker_class(&self) -> &'static str {
        match self {
            Self::Resolve => "resolve-in-editor-btn",
            Self::Execute => "execute-in-editor-btn",
            Self::OpenFile => "open-in-editor-btn",
            Self::OpenFileInline => "open-in-editor-btn-inline",
        }
    }

    pub fn marker_selector(&self) -> String {
        format!(".{}", self.marker_class())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Resolve => "Send to Editor",
            Self::Execute => "Execute in Editor",
            Self::OpenFile => "Open in Editor",
            Self::OpenFileInline => "Open",
        }
    }

    fn style(&self) -> &'static str {
        match self {
            Self::Resolve => "margin-left: 8px; padding: 4px 12px; background: #0078d4; color: white; border: none; border-radius: 2px; cursor: pointer; font-size: 12px;",
            Self::Execute => "margin-left: 12px; padding: 4px 12px; background: #107c10; color: white; border: none; border-radius: 2px; cursor: pointer; font-size: 12px; vertical-align: middle;",
            Self::OpenFile => "margin-left: 8px; padding: 2px 10px; background: #0078d4; color: white; border: none; border-radius: 2px; cursor: pointer; font-size: 12px;",
            Self::OpenFileInline => "margin-left: 6px; padding: 0 6px; background: none; color: #0078d4; border: 1px solid #0078d4; border-radius: 2px; cursor: pointer; font-size: 11px;",
        }
    }
}

impl std::fmt::Display for ControlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marker_class())
    }
}

/// What a control was bound to when it was injected. The file path is
/// captured here once and never re-derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub kind: ControlKind,
    pub file_path: String,
    pub thread: Option<NodeId>,
    pub content: Option<NodeId>,
    pub summary: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Forward the intent to the background router.
    Send(ActionIntent),
    /// Blocking message for the user; nothing is sent.
    Alert(String),
}

/// Builds a detached `<button>` for `kind`.
pub(crate) fn create_control(doc: &mut Document, kind: ControlKind, file_path: &str) -> Result<NodeId> {
    let button = doc.create_element("button");
    doc.set_attr(button, "type", "button")?;
    doc.add_class(button, kind.marker_class())?;
    doc.set_attr(button, "data-file-path", file_path)?;
    doc.set_attr(button, "style", kind.style())?;
    let label = doc.create_text(kind.label());
    doc.append_child(button, label)?;
    Ok(button)
}
