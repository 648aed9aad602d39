//! Tolerant HTML fragment parser.
//!
//! Handles the markup review pages actually ship: nested elements, quoted,
//! unquoted and boolean attributes, void and self-closing tags, raw-text
//! elements, comments and character references. Unmatched end tags are
//! dropped; anything still open at end of input is closed implicitly.

use crate::document::{Document, ElementData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

pub fn parse(html: &str) -> Document {
    let mut parser = Parser {
        input: html,
        pos: 0,
        doc: Document::new(),
        stack: Vec::new(),
        skip_leading_newline: false,
    };
    parser.run();
    parser.doc
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    doc: Document,
    stack: Vec<NodeId>,
    /// Set right after `<pre>`: a single leading newline is not content.
    skip_leading_newline: bool,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.doc.root())
    }

    fn run(&mut self) {
        while self.pos < self.input.len() {
            let rest = self.rest();
            match rest.find('<') {
                Some(0) => self.markup(),
                Some(offset) => {
                    self.text(&rest[..offset]);
                    self.pos += offset;
                }
                None => {
                    self.text(rest);
                    self.pos = self.input.len();
                }
            }
        }
    }

    fn text(&mut self, raw: &str) {
        let raw = if std::mem::take(&mut self.skip_leading_newline) {
            raw.strip_prefix("\r\n")
                .or_else(|| raw.strip_prefix('\n'))
                .unwrap_or(raw)
        } else {
            raw
        };
        if raw.is_empty() {
            return;
        }
        let parent = self.current();
        self.doc.append_text_silently(parent, &decode_entities(raw));
    }

    fn markup(&mut self) {
        self.skip_leading_newline = false;
        let rest = self.rest();
        if let Some(body) = rest.strip_prefix("<!--") {
            let (comment, consumed) = match body.find("-->") {
                Some(end) => (&body[..end], 4 + end + 3),
                None => (body, rest.len()),
            };
            let id = self.doc.create_comment(comment);
            let parent = self.current();
            self.doc.attach(parent, id);
            self.pos += consumed;
            return;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            self.pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            return;
        }
        if let Some(after) = rest.strip_prefix("</") {
            if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                self.end_tag();
            } else {
                self.pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            }
            return;
        }
        if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            self.start_tag();
        } else {
            self.text("<");
            self.pos += 1;
        }
    }

    fn read_name(&mut self) -> String {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        self.pos += len;
        rest[..len].to_ascii_lowercase()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        self.pos += rest.len() - trimmed.len();
    }

    fn end_tag(&mut self) {
        self.pos += 2;
        let name = self.read_name();
        let rest = self.rest();
        self.pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());

        let open = self
            .stack
            .iter()
            .rposition(|id| self.doc.tag_name(*id) == Some(name.as_str()));
        match open {
            Some(index) => self.stack.truncate(index),
            None => tracing::trace!(tag = %name, "dropping unmatched end tag"),
        }
    }

    fn start_tag(&mut self) {
        self.pos += 1;
        let name = self.read_name();
        let mut element = ElementData::new(&name);
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let (attr_name, value) = self.attribute();
            if !attr_name.is_empty() && element.attr(&attr_name).is_none() {
                element.attrs.push((attr_name, value));
            }
        }

        let id = self.doc.push_element(element);
        let parent = self.current();
        self.doc.attach(parent, id);

        if is_void_element(&name) || self_closing {
            return;
        }
        if is_raw_text_element(&name) {
            self.raw_text(id, &name);
            return;
        }
        if name == "pre" {
            self.skip_leading_newline = true;
        }
        self.stack.push(id);
    }

    fn attribute(&mut self) -> (String, String) {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(rest.len())
            .max(1);
        let name = rest[..len].to_ascii_lowercase();
        self.pos += len;

        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            return (name, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();

        let rest = self.rest();
        let value = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                match body.find(quote) {
                    Some(end) => {
                        self.pos += end + 2;
                        &body[..end]
                    }
                    None => {
                        self.pos = self.input.len();
                        body
                    }
                }
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                &rest[..end]
            }
        };
        (name, decode_entities(value))
    }

    fn raw_text(&mut self, element: NodeId, name: &str) {
        let rest = self.rest();
        let lower = rest.to_ascii_lowercase();
        let closing = format!("</{}", name);
        let (content, consumed) = match lower.find(&closing) {
            Some(end) => {
                let after = &rest[end..];
                let close_len = after.find('>').map(|i| i + 1).unwrap_or(after.len());
                (&rest[..end], end + close_len)
            }
            None => (rest, rest.len()),
        };
        let content = if name == "textarea" {
            let trimmed = content
                .strip_prefix("\r\n")
                .or_else(|| content.strip_prefix('\n'))
                .unwrap_or(content);
            decode_entities(trimmed)
        } else if name == "title" {
            decode_entities(content)
        } else {
            content.to_string()
        };
        if !content.is_empty() {
            let text = self.doc.create_text(&content);
            self.doc.attach(element, text);
        }
        self.pos += consumed;
    }
}

/// Decodes the character references that show up in review markup. Unknown
/// named references are left untouched.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match decode_reference(candidate) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(candidate: &str) -> Option<(char, usize)> {
    let semi = candidate.find(';')?;
    if semi > 10 {
        return None;
    }
    let name = &candidate[1..semi];
    let ch = if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        char::from_u32(code)?
    } else {
        match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            "hellip" => '\u{2026}',
            "mdash" => '\u{2014}',
            "ndash" => '\u{2013}',
            "times" => '\u{d7}',
            _ => return None,
        }
    };
    Some((ch, semi + 1))
}
