//! Argument splitting for builtin calls.

use super::call::Interpreter;
use crate::error::ShellResult;
use crate::scanner::{is_ident_start, Cursor};
use tracing::trace;

/// Text accumulated for the argument being built.
#[derive(Default)]
struct Pending {
    text: String,
    quoted: bool,
}

impl Pending {
    /// Finish the current argument. Unquoted text is trimmed and dropped when
    /// empty; anything that contained a quoted literal is kept as written.
    fn flush(&mut self, out: &mut Vec<String>) {
        let text = std::mem::take(&mut self.text);
        if self.quoted {
            out.push(text);
        } else {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
        self.quoted = false;
    }
}

impl Interpreter<'_> {
    /// Split a raw argument string into evaluated arguments.
    ///
    /// Separators are commas and whitespace outside quotes and parentheses.
    /// Nested calls are evaluated innermost first, left to right, each once.
    pub fn split_arguments(&self, raw: &str) -> ShellResult<Vec<String>> {
        let mut args = Vec::new();
        let mut pending = Pending::default();
        let mut cursor = Cursor::new(raw);

        while let Some(c) = cursor.peek() {
            match c {
                '"' | '\'' => {
                    let literal = cursor.take_quoted()?;
                    pending.text.push_str(&self.resolver.bind_literal(&literal));
                    pending.quoted = true;
                }
                '$' if cursor.peek_second().is_some_and(is_ident_start) => {
                    cursor.bump();
                    let name = cursor.take_identifier();
                    if cursor.peek() == Some('(') {
                        self.nested_call(&mut cursor, name, &mut pending.text)?;
                    } else {
                        pending.text.push_str(&self.resolver.resolve(name));
                    }
                }
                '$' => self.expand_dollar(&mut cursor, &mut pending.text)?,
                ',' => {
                    cursor.bump();
                    pending.flush(&mut args);
                }
                c if c.is_whitespace() => {
                    cursor.bump();
                    pending.flush(&mut args);
                }
                c if is_ident_start(c) => {
                    let name = cursor.take_identifier();
                    if cursor.peek() == Some('(') {
                        self.nested_call(&mut cursor, name, &mut pending.text)?;
                    } else {
                        pending.text.push_str(name);
                    }
                }
                '(' => {
                    cursor.bump();
                    let inner = cursor.take_balanced()?;
                    pending.text.push('(');
                    pending.text.push_str(inner);
                    pending.text.push(')');
                }
                c => {
                    cursor.bump();
                    pending.text.push(c);
                }
            }
        }
        pending.flush(&mut args);

        trace!(raw, ?args, "split arguments");
        Ok(args)
    }

    /// `name(...)` inside an argument list. The cursor sits on the `(`.
    ///
    /// A registered builtin is evaluated and its result spliced in. Any other
    /// name keeps the whole balanced span as literal text.
    fn nested_call(&self, cursor: &mut Cursor<'_>, name: &str, out: &mut String) -> ShellResult<()> {
        cursor.bump();
        let inner = cursor.take_balanced()?;
        if self.builtins.contains(name) {
            let args = self.split_arguments(inner)?;
            out.push_str(&self.call(name, &args)?);
        } else {
            out.push_str(name);
            out.push('(');
            out.push_str(inner);
            out.push(')');
        }
        Ok(())
    }
}
