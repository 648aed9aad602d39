use once_cell::sync::Lazy;
use prbridge_dom::{Document, NodeId, PageLocation};
use regex::Regex;
use tracing::debug;

use super::{
    is_plausible_path, path_from_attributes, path_from_instructions, repository_url,
    ExtractionStrategy, OpenFileTarget, Placement, Platform, PlatformSelectors,
};
use crate::error::Result;
use crate::instruction::is_instruction_block;

const SELECTORS: PlatformSelectors = PlatformSelectors {
    thread: ".repos-discussion-comment",
    content: ".markdown-content.markdown-editor-preview",
    actions: ".repos-discussion-comment-header",
    instruction_code: "pre.hljs code",
};

const COMMENT_VIEWER: &str = ".repos-comment-viewer";
const FILE_NAME_SPAN: &str = "span.body-s.secondary-text.text-ellipsis";
const FILE_HEADER: &str = ".comment-file-header";
const FILE_HEADER_SPAN: &str =
    "span.body-s.secondary-text.text-ellipsis, span.body-s.secondary-text";

/// Levels above the comment viewer searched for the file name.
const MAX_ANCESTOR_LEVELS: usize = 5;

/// `/org/project/_git/repo`
const REPOSITORY_DEPTH: usize = 5;

/// Debugger artifacts (`== $0 "`) that leak into copied file names.
static DEBUG_ARTIFACTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^==\s*\$\d+\s*["']?|["']$"#).expect("debug artifact regex"));

fn clean_file_name(text: &str) -> String {
    DEBUG_ARTIFACTS.replace_all(text.trim(), "").trim().to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AzureDevOps;

impl AzureDevOps {
    /// Walks up from the comment viewer looking for the file name the
    /// discussion is attached to.
    fn path_from_file_name(&self, doc: &Document, viewer: NodeId) -> Result<Option<String>> {
        let mut current = doc.parent_element(viewer);
        let mut level = 0;
        while let Some(node) = current {
            if level >= MAX_ANCESTOR_LEVELS {
                break;
            }
            if let Some(span) = doc.query_selector(node, FILE_NAME_SPAN)? {
                let path = clean_file_name(&doc.text_content(span));
                if is_plausible_path(&path) {
                    return Ok(Some(path));
                }
            }
            if let Some(header) = doc.query_selector(node, FILE_HEADER)? {
                if let Some(span) = doc.query_selector(header, FILE_HEADER_SPAN)? {
                    let path = clean_file_name(&doc.text_content(span));
                    if is_plausible_path(&path) {
                        return Ok(Some(path));
                    }
                }
            }
            current = doc.parent_element(node);
            level += 1;
        }
        Ok(None)
    }
}

impl ExtractionStrategy for AzureDevOps {
    fn platform(&self) -> Platform {
        Platform::AzureDevOps
    }

    fn selectors(&self) -> PlatformSelectors {
        SELECTORS
    }

    fn locate_file_path(&self, doc: &Document, thread: NodeId) -> Result<String> {
        let viewer = doc.closest(thread, COMMENT_VIEWER)?;
        if let Some(viewer) = viewer {
            if let Some(path) = self.path_from_file_name(doc, viewer)? {
                return Ok(path);
            }
        }
        if let Some(path) = path_from_instructions(doc, thread, SELECTORS.instruction_code)? {
            return Ok(path);
        }
        if let Some(viewer) = viewer {
            if let Some(path) = path_from_attributes(doc, viewer)? {
                return Ok(path);
            }
        }
        debug!(thread = %thread, "no file path found for Azure DevOps comment");
        Ok(String::new())
    }

    fn extract_code_snippets(&self, doc: &Document, thread: NodeId) -> Result<String> {
        let snippets: Vec<String> = doc
            .query_selector_all(thread, SELECTORS.instruction_code)?
            .into_iter()
            .map(|code| doc.text_content(code).trim().to_string())
            .filter(|text| !text.is_empty() && !is_instruction_block(text))
            .collect();
        Ok(snippets.join("\n\n---\n\n"))
    }

    fn resolve_repository_url(&self, location: &PageLocation) -> String {
        repository_url(location, REPOSITORY_DEPTH)
    }

    fn open_file_targets(&self, doc: &Document) -> Result<Vec<OpenFileTarget>> {
        let mut targets = Vec::new();
        for header in doc.query_selector_all(doc.root(), FILE_HEADER)? {
            let Some(span) = doc.query_selector(header, FILE_HEADER_SPAN)? else {
                continue;
            };
            let path = clean_file_name(&doc.text_content(span));
            if path.is_empty() {
                continue;
            }
            targets.push(OpenFileTarget {
                scope: header,
                anchor: header,
                placement: Placement::Append,
                file_path: path,
                inline: false,
            });
        }

        // File names shown outside a header get an inline control beside them.
        for span in doc.query_selector_all(doc.root(), FILE_NAME_SPAN)? {
            if doc.closest(span, FILE_HEADER)?.is_some() {
                continue;
            }
            let path = clean_file_name(&doc.text_content(span));
            if path.is_empty() {
                continue;
            }
            let scope = doc.parent_element(span).unwrap_or(span);
            targets.push(OpenFileTarget {
                scope,
                anchor: span,
                placement: Placement::After,
                file_path: path,
                inline: true,
            });
        }
        Ok(targets)
    }
}
