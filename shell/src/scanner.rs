//! Character-level scanning shared by every grammar rule.
//!
//! All offsets are byte offsets into the scanned text.

use crate::error::{ShellError, ShellResult};

pub const PIPE: &str = "|>";

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
}

/// Length of the identifier at the start of `s`, or 0.
pub fn ident_len(s: &str) -> usize {
    match s.chars().next() {
        Some(c) if is_ident_start(c) => s
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(s.len()),
        _ => 0,
    }
}

/// Index of the `)` matching an already consumed `(`.
///
/// `start` is the offset just past the opening parenthesis. Quoted regions are
/// opaque; inside them a backslash escapes the character that follows it.
/// Outside quotes a backslash is an ordinary character. Returns `None` when the
/// text ends before the depth returns to zero.
pub fn find_matching_paren(text: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in text.get(start..)?.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            (None, _) => {}
        }
    }
    None
}

/// Process `\n`, `\t`, `\r` and `\\`. Any other escape is kept as written.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split `text` on `sep` wherever it occurs outside quotes and parentheses.
pub fn split_top_level<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for at in top_level_matches(text, sep) {
        parts.push(&text[last..at]);
        last = at + sep.len();
    }
    parts.push(&text[last..]);
    parts
}

pub fn contains_top_level(text: &str, sep: &str) -> bool {
    !top_level_matches(text, sep).is_empty()
}

fn top_level_matches(text: &str, sep: &str) -> Vec<usize> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut skip_until = 0;

    for (i, c) in text.char_indices() {
        if i < skip_until {
            continue;
        }
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, _) if depth == 0 && text[i..].starts_with(sep) => {
                found.push(i);
                skip_until = i + sep.len();
            }
            (None, _) => {}
        }
    }
    found
}

/// Replace `$name` and `${name}` references for which `lookup` has a value.
///
/// A single pass: replacement text is never scanned again. `$name` only
/// matches a whole identifier, so `$xy` is not a reference to `x`.
pub fn substitute_with<'v>(template: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(at) = rest.find('$') {
        out.push_str(&rest[..at]);
        let after = &rest[at + 1..];

        let braced = after
            .strip_prefix('{')
            .and_then(|inner| inner.find('}').map(|end| (&inner[..end], end + 2)))
            .filter(|(name, _)| is_identifier(name));
        let (name, consumed) = match braced {
            Some(found) => found,
            None => {
                let len = ident_len(after);
                (&after[..len], len)
            }
        };

        match lookup(name).filter(|_| !name.is_empty()) {
            Some(value) => {
                out.push_str(value);
                rest = &after[consumed..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Forward-only cursor over a line of input.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    pub fn take_identifier(&mut self) -> &'a str {
        let len = ident_len(self.rest());
        let ident = &self.rest()[..len];
        self.pos += len;
        ident
    }

    /// Consume a quoted literal starting at the opening quote and return its
    /// escape-processed content.
    pub fn take_quoted(&mut self) -> ShellResult<String> {
        let start = self.pos;
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(ShellError::parse("expected a quote")),
        };

        let mut out = String::new();
        while let Some(c) = self.bump() {
            match c {
                '\\' => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(other) => out.push(other),
                    None => break,
                },
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err(ShellError::parse(format!(
            "unterminated quote in '{}'",
            &self.src[start..]
        )))
    }

    /// Consume everything up to the matching `)`. The cursor must sit just
    /// past the opening parenthesis; it ends just past the closing one.
    pub fn take_balanced(&mut self) -> ShellResult<&'a str> {
        let open = self.pos.saturating_sub(1);
        let close = find_matching_paren(self.src, self.pos).ok_or_else(|| {
            ShellError::parse(format!("unbalanced parentheses in '{}'", &self.src[open..]))
        })?;
        let inner = &self.src[self.pos..close];
        self.pos = close + 1;
        Ok(inner)
    }
}
