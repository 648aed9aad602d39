//! Per-platform knowledge of where review comments live in a page and how to
//! recover the file and repository they refer to.

mod azure;
mod github;

pub use azure::AzureDevOps;
pub use github::GitHub;

use prbridge_dom::{Document, NodeId, PageLocation};

use crate::error::Result;
use crate::instruction::InstructionBlock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    GitHub,
    AzureDevOps,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::AzureDevOps => "azure-devops",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectors identifying the page regions a strategy works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformSelectors {
    /// One review comment.
    pub thread: &'static str,
    /// The comment's rendered body.
    pub content: &'static str,
    /// Where controls for the comment are attached.
    pub actions: &'static str,
    /// Code blocks that may carry an instruction header.
    pub instruction_code: &'static str,
}

/// How a new control is placed relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Append,
    After,
}

/// A spot where an open-file control belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFileTarget {
    /// Region checked for an existing control before inserting.
    pub scope: NodeId,
    pub anchor: NodeId,
    pub placement: Placement,
    pub file_path: String,
    /// Rendered beside a link or file name rather than inside a file header.
    pub inline: bool,
}

pub trait ExtractionStrategy {
    fn platform(&self) -> Platform;

    fn selectors(&self) -> PlatformSelectors;

    /// Repository-relative path of the file a thread comments on. Empty when
    /// every heuristic fails.
    fn locate_file_path(&self, doc: &Document, thread: NodeId) -> Result<String>;

    /// Code referenced by a thread, joined with the platform separator.
    fn extract_code_snippets(&self, doc: &Document, thread: NodeId) -> Result<String>;

    fn resolve_repository_url(&self, location: &PageLocation) -> String;

    fn open_file_targets(&self, doc: &Document) -> Result<Vec<OpenFileTarget>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    GitHub(GitHub),
    AzureDevOps(AzureDevOps),
}

/// Picks the strategy for a page origin (or full URL, or bare host). `None`
/// means the page is unsupported.
pub fn select(origin: &str) -> Option<Strategy> {
    let rest = origin
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(origin);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);
    let host = host.split(':').next().unwrap_or("").to_ascii_lowercase();
    match host.as_str() {
        "github.com" => Some(Strategy::GitHub(GitHub)),
        "dev.azure.com" => Some(Strategy::AzureDevOps(AzureDevOps)),
        _ => None,
    }
}

impl ExtractionStrategy for Strategy {
    fn platform(&self) -> Platform {
        match self {
            Self::GitHub(s) => s.platform(),
            Self::AzureDevOps(s) => s.platform(),
        }
    }

    fn selectors(&self) -> PlatformSelectors {
        match self {
            Self::GitHub(s) => s.selectors(),
            Self::AzureDevOps(s) => s.selectors(),
        }
    }

    fn locate_file_path(&self, doc: &Document, thread: NodeId) -> Result<String> {
        match self {
            Self::GitHub(s) => s.locate_file_path(doc, thread),
            Self::AzureDevOps(s) => s.locate_file_path(doc, thread),
        }
    }

    fn extract_code_snippets(&self, doc: &Document, thread: NodeId) -> Result<String> {
        match self {
            Self::GitHub(s) => s.extract_code_snippets(doc, thread),
            Self::AzureDevOps(s) => s.extract_code_snippets(doc, thread),
        }
    }

    fn resolve_repository_url(&self, location: &PageLocation) -> String {
        match self {
            Self::GitHub(s) => s.resolve_repository_url(location),
            Self::AzureDevOps(s) => s.resolve_repository_url(location),
        }
    }

    fn open_file_targets(&self, doc: &Document) -> Result<Vec<OpenFileTarget>> {
        match self {
            Self::GitHub(s) => s.open_file_targets(doc),
            Self::AzureDevOps(s) => s.open_file_targets(doc),
        }
    }
}

pub(crate) fn is_plausible_path(path: &str) -> bool {
    !path.is_empty() && path.contains('/')
}

/// First plausible path named by an instruction block inside `scope`.
pub(crate) fn path_from_instructions(
    doc: &Document,
    scope: NodeId,
    code_selector: &str,
) -> Result<Option<String>> {
    for code in doc.query_selector_all(scope, code_selector)? {
        let text = doc.text_content(code);
        if let Some(path) = InstructionBlock::parse(&text)
            .as_ref()
            .and_then(InstructionBlock::plausible_path)
        {
            return Ok(Some(path.to_string()));
        }
    }
    Ok(None)
}

/// First plausible `data-file-path` (or path-like `title`) inside `scope`.
pub(crate) fn path_from_attributes(doc: &Document, scope: NodeId) -> Result<Option<String>> {
    for id in doc.query_selector_all(scope, r#"[data-file-path], [title*="/"]"#)? {
        let value = doc
            .attr(id, "data-file-path")
            .filter(|v| !v.is_empty())
            .or_else(|| doc.attr(id, "title"))
            .unwrap_or("");
        if is_plausible_path(value) {
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

pub(crate) fn repository_url(location: &PageLocation, depth: usize) -> String {
    format!(
        "{}://{}{}",
        location.scheme(),
        location.hostname(),
        location.path_prefix(depth)
    )
}
