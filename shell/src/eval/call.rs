//! Builtin call evaluation: `name(args)`, `$(name args)` and value expansion.

use crate::builtins::BuiltinRegistry;
use crate::error::{ShellError, ShellResult};
use crate::scanner::{find_matching_paren, ident_len, Cursor};
use crate::scope::Resolver;
use tracing::trace;

/// Split `line` into `(name, inner)` when it is exactly `name(...)`.
///
/// Returns `Ok(None)` when the line does not start with an identifier and an
/// opening parenthesis, or when anything but whitespace follows the matching
/// close. An opening parenthesis that is never closed is a parse error.
pub fn parse_call_shape(line: &str) -> ShellResult<Option<(&str, &str)>> {
    let line = line.trim();
    let name_len = ident_len(line);
    if name_len == 0 || !line[name_len..].starts_with('(') {
        return Ok(None);
    }

    let open = name_len + 1;
    let close = find_matching_paren(line, open)
        .ok_or_else(|| ShellError::parse(format!("unbalanced parentheses in '{line}'")))?;
    if !line[close + 1..].trim().is_empty() {
        return Ok(None);
    }
    Ok(Some((&line[..name_len], &line[open..close])))
}

/// Evaluates builtin calls against a registry and a variable scope.
///
/// Holds only shared borrows; evaluation never writes to either.
#[derive(Clone, Copy)]
pub struct Interpreter<'a> {
    pub(crate) builtins: &'a BuiltinRegistry,
    pub(crate) resolver: Resolver<'a>,
}

impl<'a> Interpreter<'a> {
    pub fn new(builtins: &'a BuiltinRegistry, resolver: Resolver<'a>) -> Self {
        Self { builtins, resolver }
    }

    pub fn builtins(&self) -> &'a BuiltinRegistry {
        self.builtins
    }

    pub fn resolver(&self) -> Resolver<'a> {
        self.resolver
    }

    /// Evaluate `line` if it is a call to a registered builtin.
    ///
    /// `Ok(None)` means the line is not handled here and no side effect
    /// occurred; the caller falls back to module dispatch.
    pub fn try_evaluate_call(&self, line: &str) -> ShellResult<Option<String>> {
        let Some((name, inner)) = parse_call_shape(line)? else {
            return Ok(None);
        };
        if !self.builtins.contains(name) {
            return Ok(None);
        }
        let args = self.split_arguments(inner)?;
        self.call(name, &args).map(Some)
    }

    /// Run a builtin with already evaluated arguments.
    pub fn call(&self, name: &str, args: &[String]) -> ShellResult<String> {
        self.builtins.execute(name, args)
    }

    /// Evaluate the inside of `$(...)`: either `name(args)` or `name args`.
    ///
    /// Unlike a bare call, the name must be a registered builtin.
    pub fn evaluate_inline(&self, inner: &str) -> ShellResult<String> {
        let inner = inner.trim();
        let (name, raw_args) = match parse_call_shape(inner)? {
            Some(shape) => shape,
            None => {
                let name_len = ident_len(inner);
                let rest = &inner[name_len..];
                if name_len == 0 || !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
                    return Err(ShellError::parse(format!(
                        "expected a builtin name in '$({inner})'"
                    )));
                }
                (&inner[..name_len], rest)
            }
        };

        if !self.builtins.contains(name) {
            return Err(ShellError::UnknownBuiltin(name.to_string()));
        }
        let args = self.split_arguments(raw_args)?;
        trace!(builtin = name, ?args, "inline evaluation");
        self.call(name, &args)
    }

    /// Expand `$(...)` and `$name` inside a value without splitting it.
    pub fn expand(&self, text: &str) -> ShellResult<String> {
        if !text.contains('$') {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = Cursor::new(text);
        while let Some(c) = cursor.peek() {
            if c == '$' {
                self.expand_dollar(&mut cursor, &mut out)?;
            } else {
                cursor.bump();
                out.push(c);
            }
        }
        Ok(out)
    }

    /// Handle a `$` at the cursor: `$(...)`, `$name`, `${name}`, or a literal
    /// dollar.
    pub(crate) fn expand_dollar(&self, cursor: &mut Cursor<'_>, out: &mut String) -> ShellResult<()> {
        cursor.bump();
        match cursor.peek() {
            Some('(') => {
                cursor.bump();
                let inner = cursor.take_balanced()?;
                out.push_str(&self.evaluate_inline(inner)?);
            }
            Some(c) if crate::scanner::is_ident_start(c) => {
                let name = cursor.take_identifier();
                out.push_str(&self.resolver.resolve(name));
            }
            Some('{') => {
                let braced = cursor.rest()[1..]
                    .split_once('}')
                    .map(|(name, _)| name)
                    .filter(|name| crate::scanner::is_identifier(name));
                if let Some(name) = braced {
                    cursor.eat('{');
                    cursor.take_identifier();
                    cursor.eat('}');
                    out.push_str(&self.resolver.resolve(name));
                } else {
                    out.push('$');
                }
            }
            _ => out.push('$'),
        }
        Ok(())
    }
}
