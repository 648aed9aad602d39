//! The "agent instruction" convention used by review bots: a code block whose
//! first line is `In <path> [around lines ...]` (or `In` alone, with the path
//! on the next line), followed by the instruction itself.

use once_cell::sync::Lazy;
use regex::Regex;

static LOCATION_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[,;:]?\s+(around|at|on)\s+(lines?|line).*").expect("location qualifier regex")
});

/// Same-line header: the path runs up to a qualifier clause, a separator or
/// the end of the line, so it may contain spaces.
static SAME_LINE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^In\s+(.+?)(?:\s+(?:around|at)\b|\s+on\s+lines?\b|[,;]|$)")
        .expect("same-line header regex")
});

pub fn is_instruction_block(text: &str) -> bool {
    text.starts_with("In ") || text.starts_with("In\n")
}

/// Removes a trailing `around lines 10-12` / `at line 4` / `on lines ...` clause.
pub fn strip_location_qualifier(text: &str) -> String {
    LOCATION_QUALIFIER.replace(text, "").trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionBlock {
    /// Path named by the header line, qualifiers removed. Not validated.
    pub path: Option<String>,
    /// Everything after the header, trimmed.
    pub body: String,
}

impl InstructionBlock {
    /// Parses a code block's text; `None` when it does not follow the
    /// convention.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !is_instruction_block(text) {
            return None;
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let first = lines[0].trim();

        if first == "In" {
            let second = lines.get(1).map(|l| l.trim()).unwrap_or("");
            if second.contains('/') {
                return Some(Self {
                    path: Some(strip_location_qualifier(second)).filter(|p| !p.is_empty()),
                    body: join_from(&lines, 2),
                });
            }
            return Some(Self {
                path: None,
                body: join_from(&lines, 1),
            });
        }

        let path = SAME_LINE_HEADER
            .captures(first)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().trim_end_matches(':').to_string())
            .filter(|p| !p.is_empty());

        Some(Self {
            path,
            body: join_from(&lines, 1),
        })
    }

    /// The header path when it looks like a repository path.
    pub fn plausible_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| p.contains('/'))
    }
}

fn join_from(lines: &[&str], start: usize) -> String {
    lines
        .get(start..)
        .map(|rest| rest.join("\n"))
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_line_path() {
        let block = InstructionBlock::parse("In src/foo.ts\nDo the thing").unwrap();
        assert_eq!(block.path.as_deref(), Some("src/foo.ts"));
        assert_eq!(block.body, "Do the thing");
    }

    #[test]
    fn same_line_path_with_qualifier() {
        let block =
            InstructionBlock::parse("In src/app/main.rs around lines 40 - 52, the loop\nFix it")
                .unwrap();
        assert_eq!(block.plausible_path(), Some("src/app/main.rs"));
        assert_eq!(block.body, "Fix it");

        let block = InstructionBlock::parse("In lib/x.py, at line 3\nRename").unwrap();
        assert_eq!(block.path.as_deref(), Some("lib/x.py"));
    }

    #[test]
    fn same_line_path_may_contain_spaces() {
        let block =
            InstructionBlock::parse("In src/my dir/a.ts around lines 3\nTidy up").unwrap();
        assert_eq!(block.plausible_path(), Some("src/my dir/a.ts"));
        assert_eq!(block.body, "Tidy up");

        let block = InstructionBlock::parse("In docs/Release Notes.md\nAdd 2.1").unwrap();
        assert_eq!(block.path.as_deref(), Some("docs/Release Notes.md"));

        let block = InstructionBlock::parse("In src/old files/b.rs on lines 4-9\nDrop it").unwrap();
        assert_eq!(block.path.as_deref(), Some("src/old files/b.rs"));
    }

    #[test]
    fn path_on_second_line() {
        let block =
            InstructionBlock::parse("In\nsrc/bar.ts around lines 10-12\nFix this").unwrap();
        assert_eq!(block.path.as_deref(), Some("src/bar.ts"));
        assert_eq!(block.body, "Fix this");
    }

    #[test]
    fn bare_header_without_path_keeps_second_line_as_body() {
        let block = InstructionBlock::parse("In\nthe constructor\ncheck nulls").unwrap();
        assert_eq!(block.path, None);
        assert_eq!(block.body, "the constructor\ncheck nulls");
    }

    #[test]
    fn other_blocks_are_not_instructions() {
        assert!(InstructionBlock::parse("fn main() {}").is_none());
        assert!(InstructionBlock::parse("Insert a check").is_none());
        assert!(is_instruction_block("In\nx"));
    }

    #[test]
    fn prose_header_is_parsed_but_not_plausible() {
        let block = InstructionBlock::parse("In this function, add logging").unwrap();
        assert_eq!(block.path.as_deref(), Some("this"));
        assert_eq!(block.plausible_path(), None);
        assert_eq!(block.body, "");
    }

    #[test]
    fn qualifier_only_stripped_when_present() {
        assert_eq!(strip_location_qualifier("src/a.rs"), "src/a.rs");
        assert_eq!(strip_location_qualifier("src/a.rs, On Line 9"), "src/a.rs");
    }
}
