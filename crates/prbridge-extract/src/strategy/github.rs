use prbridge_dom::{Document, NodeId, PageLocation};
use tracing::debug;

use super::{
    path_from_attributes, path_from_instructions, repository_url, ExtractionStrategy,
    OpenFileTarget, Placement, Platform, PlatformSelectors,
};
use crate::error::Result;
use crate::instruction::is_instruction_block;

const SELECTORS: PlatformSelectors = PlatformSelectors {
    thread: ".timeline-comment-group",
    content: ".comment-body",
    actions: ".timeline-comment-actions",
    instruction_code: "pre code",
};

const REVIEW_THREAD: &str = ".review-thread-component";
const DIFF_CODE: &str = ".blob-code-inner";
const CONVERSATION_FILE_LINK: &str = "summary a.Link--primary";
const SUGGESTION_PATH_INPUT: &str = r#"form.js-single-suggested-change-form input[name="path"]"#;

/// `/owner/repo`
const REPOSITORY_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GitHub;

impl GitHub {
    /// Title of the link in the enclosing file header on the "Files changed" tab.
    fn path_from_file_header(&self, doc: &Document, thread: NodeId) -> Result<Option<String>> {
        let Some(file) = doc.closest(thread, ".file")? else {
            return Ok(None);
        };
        let Some(link) = doc.query_selector(file, ".file-header a[title]")? else {
            return Ok(None);
        };
        Ok(doc
            .attr(link, "title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }

    /// Conversation-tab alternates: the thread's summary link, then the
    /// hidden path field of the suggested-change form.
    fn path_from_conversation(&self, doc: &Document, review: NodeId) -> Result<Option<String>> {
        for link in doc.query_selector_all(review, CONVERSATION_FILE_LINK)? {
            if !doc.attr(link, "href").is_some_and(|h| h.contains("/files")) {
                continue;
            }
            let text = doc.text_content(link);
            let text = text.trim();
            if !text.is_empty() {
                return Ok(Some(text.to_string()));
            }
        }

        if let Some(input) = doc.query_selector(review, SUGGESTION_PATH_INPUT)? {
            if let Some(value) = doc.attr(input, "value").filter(|v| !v.is_empty()) {
                return Ok(Some(value.to_string()));
            }
        }
        Ok(None)
    }
}

impl ExtractionStrategy for GitHub {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    fn selectors(&self) -> PlatformSelectors {
        SELECTORS
    }

    fn locate_file_path(&self, doc: &Document, thread: NodeId) -> Result<String> {
        if let Some(path) = self.path_from_file_header(doc, thread)? {
            return Ok(path);
        }
        if let Some(path) = path_from_instructions(doc, thread, SELECTORS.instruction_code)? {
            return Ok(path);
        }
        if let Some(review) = doc.closest(thread, REVIEW_THREAD)? {
            if let Some(path) = path_from_attributes(doc, review)? {
                return Ok(path);
            }
            if let Some(path) = self.path_from_conversation(doc, review)? {
                return Ok(path);
            }
        }
        debug!(thread = %thread, "no file path found for GitHub comment");
        Ok(String::new())
    }

    fn extract_code_snippets(&self, doc: &Document, thread: NodeId) -> Result<String> {
        let Some(review) = doc.closest(thread, REVIEW_THREAD)? else {
            return Ok(String::new());
        };
        let snippets: Vec<String> = doc
            .query_selector_all(review, DIFF_CODE)?
            .into_iter()
            .map(|code| doc.text_content(code))
            .filter(|text| !is_instruction_block(text.trim_start()))
            .collect();
        Ok(snippets.join("\n\n"))
    }

    fn resolve_repository_url(&self, location: &PageLocation) -> String {
        repository_url(location, REPOSITORY_DEPTH)
    }

    fn open_file_targets(&self, doc: &Document) -> Result<Vec<OpenFileTarget>> {
        let mut targets = Vec::new();

        for header in doc.query_selector_all(doc.root(), ".file-header")? {
            let Some(link) = doc.query_selector(header, "a[title]")? else {
                continue;
            };
            let path = doc.attr(link, "title").map(str::trim).unwrap_or("");
            if path.is_empty() {
                continue;
            }
            let anchor = doc.query_selector(header, ".file-info")?.unwrap_or(header);
            targets.push(OpenFileTarget {
                scope: header,
                anchor,
                placement: Placement::Append,
                file_path: path.to_string(),
                inline: false,
            });
        }

        let links = format!("{REVIEW_THREAD} {CONVERSATION_FILE_LINK}");
        for link in doc.query_selector_all(doc.root(), &links)? {
            if !doc.attr(link, "href").is_some_and(|h| h.contains("/files")) {
                continue;
            }
            let text = doc.text_content(link);
            let path = text.trim();
            if path.is_empty() {
                continue;
            }
            let scope = doc.parent_element(link).unwrap_or(link);
            targets.push(OpenFileTarget {
                scope,
                anchor: link,
                placement: Placement::After,
                file_path: path.to_string(),
                inline: true,
            });
        }

        Ok(targets)
    }
}
