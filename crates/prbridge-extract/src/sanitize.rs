use once_cell::sync::Lazy;
use prbridge_dom::{Document, NodeId};
use regex::Regex;

use crate::error::Result;

/// Interactive and script-like elements, including copy-button widgets.
const INTERACTIVE: &str =
    "button, script, style, svg, .copy-btn, .copy-btn-container, .copy-btn-tooltip";

/// Platform chrome that repeats content already present in the comment.
const PLATFORM_CHROME: &str = "details, .repos-summary-code-diff, .screen-reader-only";

static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n\s*\n\s*\n").expect("blank run regex"));

/// Plain text of a comment's content region, without UI elements and with
/// whitespace tidied: long blank runs collapse and every line is trimmed.
pub fn sanitize_comment(doc: &Document, content: NodeId) -> Result<String> {
    let mut scratch = doc.clone_subtree(content);
    let Some(scope) = scratch.children(scratch.root()).first().copied() else {
        return Ok(String::new());
    };

    for selector in [INTERACTIVE, PLATFORM_CHROME] {
        for id in scratch.query_selector_all(scope, selector)? {
            scratch.remove(id)?;
        }
    }

    let text = scratch.text_content(scope);
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = text
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(text.trim().to_string())
}
