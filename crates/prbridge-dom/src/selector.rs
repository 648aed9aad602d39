//! The selector subset the extraction strategies rely on.
//!
//! Supported: type selectors, `*`, `.class`, `#id`, `[attr]`, `[attr=v]`,
//! `[attr*=v]`, `[attr^=v]`, `[attr$=v]`, `:not(<compound>)`, descendant and
//! child combinators, and comma-separated lists.

use thiserror::Error;

use crate::document::{Document, NodeId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected '{found}' at offset {offset} in selector \"{selector}\"")]
    Unexpected {
        selector: String,
        offset: usize,
        found: char,
    },

    #[error("Unterminated {what} in selector \"{selector}\"")]
    Unterminated { selector: String, what: &'static str },

    #[error("Unsupported pseudo-class :{0}")]
    UnsupportedPseudo(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
}

impl AttrSelector {
    fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(expected) => value == expected,
            AttrOp::Contains(needle) => !needle.is_empty() && value.contains(needle.as_str()),
            AttrOp::Prefix(prefix) => !prefix.is_empty() && value.starts_with(prefix.as_str()),
            AttrOp::Suffix(suffix) => !suffix.is_empty() && value.ends_with(suffix.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    negations: Vec<Compound>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.negations.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if tag != "*" && el.name != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        if !self.attrs.iter().all(|a| a.matches(el.attr(&a.name))) {
            return false;
        }
        !self.negations.iter().any(|n| n.matches(doc, node))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A compound plus how it relates to the compound before it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    combinator: Combinator,
    compound: Compound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    steps: Vec<Step>,
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_at(doc, node, self.steps.len() - 1)
    }

    fn matches_at(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        let step = &self.steps[index];
        if !step.compound.matches(doc, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match step.combinator {
            Combinator::Child => doc
                .parent_element(node)
                .is_some_and(|p| self.matches_at(doc, p, index - 1)),
            Combinator::Descendant => doc
                .ancestors(node)
                .filter(|a| doc.is_element(*a))
                .any(|a| self.matches_at(doc, a, index - 1)),
        }
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for part in split_top_level(input) {
            alternatives.push(parse_complex(input, part.trim())?);
        }
        if alternatives.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { alternatives })
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, node))
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

/// Splits on commas that are not inside brackets, parentheses or quotes.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth -= 1,
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

struct Cursor<'a> {
    whole: &'a str,
    text: &'a str,
    base: usize,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
        self.pos > start
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected {
                selector: self.whole.to_string(),
                offset: self.base + self.pos,
                found,
            },
            None => SelectorError::Unterminated {
                selector: self.whole.to_string(),
                what: "selector",
            },
        }
    }

    fn unterminated(&self, what: &'static str) -> SelectorError {
        SelectorError::Unterminated {
            selector: self.whole.to_string(),
            what,
        }
    }
}

fn parse_complex(whole: &str, text: &str) -> Result<Complex, SelectorError> {
    if text.is_empty() {
        return Err(SelectorError::Empty);
    }
    let base = whole.find(text).unwrap_or(0);
    let mut cursor = Cursor {
        whole,
        text,
        base,
        pos: 0,
    };
    let mut steps = Vec::new();
    let mut combinator = Combinator::Descendant;

    loop {
        let compound = parse_compound(&mut cursor)?;
        if compound.is_empty() {
            return Err(cursor.unexpected());
        }
        steps.push(Step {
            combinator,
            compound,
        });

        let had_space = cursor.skip_whitespace();
        match cursor.peek() {
            None => break,
            Some('>') => {
                cursor.bump();
                cursor.skip_whitespace();
                combinator = Combinator::Child;
            }
            Some(_) if had_space => combinator = Combinator::Descendant,
            Some(_) => return Err(cursor.unexpected()),
        }
    }

    Ok(Complex { steps })
}

fn parse_compound(cursor: &mut Cursor<'_>) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();

    if cursor.eat('*') {
        compound.tag = Some("*".to_string());
    } else if cursor.peek().is_some_and(is_ident_char) {
        compound.tag = Some(cursor.ident()?.to_ascii_lowercase());
    }

    loop {
        match cursor.peek() {
            Some('.') => {
                cursor.bump();
                compound.classes.push(cursor.ident()?);
            }
            Some('#') => {
                cursor.bump();
                compound.id = Some(cursor.ident()?);
            }
            Some('[') => {
                cursor.bump();
                compound.attrs.push(parse_attribute(cursor)?);
            }
            Some(':') => {
                cursor.bump();
                let pseudo = cursor.ident()?;
                if pseudo != "not" {
                    return Err(SelectorError::UnsupportedPseudo(pseudo));
                }
                if !cursor.eat('(') {
                    return Err(cursor.unexpected());
                }
                cursor.skip_whitespace();
                let inner = parse_compound(cursor)?;
                cursor.skip_whitespace();
                if !cursor.eat(')') {
                    return Err(cursor.unterminated(":not()"));
                }
                compound.negations.push(inner);
            }
            _ => break,
        }
    }

    Ok(compound)
}

fn parse_attribute(cursor: &mut Cursor<'_>) -> Result<AttrSelector, SelectorError> {
    cursor.skip_whitespace();
    let name = cursor.ident()?.to_ascii_lowercase();
    cursor.skip_whitespace();

    let op_char = match cursor.peek() {
        Some(']') => {
            cursor.bump();
            return Ok(AttrSelector {
                name,
                op: AttrOp::Exists,
            });
        }
        Some(c @ ('*' | '^' | '$')) => {
            cursor.bump();
            Some(c)
        }
        Some('=') => None,
        Some(_) => return Err(cursor.unexpected()),
        None => return Err(cursor.unterminated("attribute selector")),
    };
    if !cursor.eat('=') {
        return Err(cursor.unexpected());
    }
    cursor.skip_whitespace();

    let value = match cursor.peek() {
        Some(quote @ ('"' | '\'')) => {
            cursor.bump();
            let start = cursor.pos;
            loop {
                match cursor.bump() {
                    Some(c) if c == quote => break,
                    Some(_) => {}
                    None => return Err(cursor.unterminated("quoted value")),
                }
            }
            cursor.text[start..cursor.pos - 1].to_string()
        }
        Some(_) => cursor.ident()?,
        None => return Err(cursor.unterminated("attribute selector")),
    };
    cursor.skip_whitespace();
    if !cursor.eat(']') {
        return Err(cursor.unterminated("attribute selector"));
    }

    let op = match op_char {
        None => AttrOp::Equals(value),
        Some('*') => AttrOp::Contains(value),
        Some('^') => AttrOp::Prefix(value),
        Some(_) => AttrOp::Suffix(value),
    };
    Ok(AttrSelector { name, op })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(html: &str, selector: &str) -> Vec<String> {
        let doc = Document::parse(html);
        doc.query_selector_all(doc.root(), selector)
            .unwrap()
            .into_iter()
            .map(|id| doc.text_content(id))
            .collect()
    }

    #[test]
    fn compound_classes_must_all_match() {
        let html = r#"<span class="body-s secondary-text">a</span>
            <span class="body-s secondary-text text-ellipsis">b</span>"#;
        assert_eq!(select(html, "span.body-s.secondary-text.text-ellipsis"), vec!["b"]);
        assert_eq!(select(html, "span.body-s.secondary-text"), vec!["a", "b"]);
    }

    #[test]
    fn descendant_and_list_selectors() {
        let html = r#"<pre class="hljs"><code>one</code></pre><pre><code>two</code></pre><code>three</code>"#;
        assert_eq!(select(html, "pre.hljs code"), vec!["one"]);
        assert_eq!(select(html, "pre code, pre.hljs code"), vec!["one", "two"]);
    }

    #[test]
    fn child_combinator_requires_direct_parent() {
        let html = "<div class=a><p><b>deep</b></p><b>direct</b></div>";
        assert_eq!(select(html, ".a > b"), vec!["direct"]);
        assert_eq!(select(html, ".a b"), vec!["deep", "direct"]);
    }

    #[test]
    fn attribute_operators() {
        let html = r#"<a title="src/a.rs">1</a><a title="readme">2</a><i data-file-path="x">3</i>
            <input name="path" value="v"><input name="other">"#;
        assert_eq!(select(html, r#"[title*="/"]"#), vec!["1"]);
        assert_eq!(select(html, "[data-file-path], [title*=\"/\"]"), vec!["1", "3"]);
        assert_eq!(select(html, "a[title]").len(), 2);

        let doc = Document::parse(html);
        let inputs = doc.query_selector_all(doc.root(), r#"input[name="path"]"#).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(doc.attr(inputs[0], "value"), Some("v"));
    }

    #[test]
    fn negation_excludes_marked_elements() {
        let html = r#"<span class="t">a</span><span class="t processed">b</span>"#;
        assert_eq!(select(html, "span.t:not(.processed)"), vec!["a"]);
    }

    #[test]
    fn ancestors_outside_scope_still_count() {
        let doc = Document::parse("<pre><code><span class=x>in</span></code></pre>");
        let code = doc.query_selector(doc.root(), "code").unwrap().unwrap();
        let found = doc.query_selector(code, "pre span.x").unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn rejects_malformed_selectors() {
        assert_eq!(Selector::parse(""), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("a[title"),
            Err(SelectorError::Unterminated { .. })
        ));
        assert!(matches!(
            Selector::parse("a:hover"),
            Err(SelectorError::UnsupportedPseudo(_))
        ));
        assert!(matches!(
            Selector::parse("a,,b"),
            Err(SelectorError::Empty)
        ));
    }
}
