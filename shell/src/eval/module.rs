//! Module invocation: `name key=value positional ...`.

use super::call::Interpreter;
use crate::error::{ShellError, ShellResult};
use crate::scanner::{is_identifier, Cursor};
use crate::shell::Shell;
use modsh_core::{run_fanout, ExecutionResult, ModuleArgs, ModuleError};
use std::sync::Arc;
use tracing::{debug, info};

const THREADS_KEY: &str = "threads";
const SAVE_KEY: &str = "save";
const INPUT_KEY: &str = "input";

/// Arguments for one module invocation, after expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCall {
    pub args: ModuleArgs,
    /// Concurrent workers requested with `threads=N`.
    pub workers: usize,
    /// Key whose value was written as a bare `$name`.
    pub placeholder: Option<String>,
}

impl Default for ModuleCall {
    fn default() -> Self {
        Self {
            args: ModuleArgs::new(),
            workers: 1,
            placeholder: None,
        }
    }
}

impl ModuleCall {
    /// Hand piped input to the module: it replaces the first `key=$name`
    /// placeholder, or arrives as `input=`.
    pub fn inject(&mut self, input: String) {
        let key = self
            .placeholder
            .take()
            .unwrap_or_else(|| INPUT_KEY.to_string());
        self.args.insert(key, input);
    }
}

/// Outcome of a module run started from the shell.
#[derive(Debug, Clone)]
pub struct ModuleRun {
    pub name: String,
    pub args: ModuleArgs,
    pub workers: usize,
    pub result: ExecutionResult,
}

/// Split on whitespace outside quotes and parentheses, keeping quotes.
fn split_words(text: &str) -> ShellResult<Vec<&str>> {
    let mut words = Vec::new();
    let mut cursor = Cursor::new(text);
    loop {
        cursor.take_while(char::is_whitespace);
        if cursor.is_eof() {
            break;
        }
        let start = cursor.pos();
        while let Some(c) = cursor.peek() {
            match c {
                c if c.is_whitespace() => break,
                '"' | '\'' => {
                    cursor.take_quoted()?;
                }
                '(' => {
                    cursor.bump();
                    cursor.take_balanced()?;
                }
                _ => {
                    cursor.bump();
                }
            }
        }
        words.push(&text[start..cursor.pos()]);
    }
    Ok(words)
}

/// `key=value` split, when the key is an identifier.
fn split_assignment(word: &str) -> Option<(&str, &str)> {
    word.split_once('=')
        .filter(|(key, _)| is_identifier(key))
}

fn is_placeholder(raw: &str) -> bool {
    raw.strip_prefix('$').is_some_and(is_identifier)
}

impl Interpreter<'_> {
    /// Parse the argument words of a module invocation.
    ///
    /// Accepts `key=value`, `key = value`, `key= value` and quoted values.
    /// Other words become positional `arg0`, `arg1`, ... Values expand
    /// `$(...)` and `$name`; single-quoted values only see loop variables.
    pub fn module_args(&self, raw: &str) -> ShellResult<ModuleCall> {
        let words = split_words(raw)?;
        let mut call = ModuleCall::default();
        let mut positional = 0usize;
        let mut i = 0;

        while i < words.len() {
            let word = words[i];
            let (key, raw_value) = if words.get(i + 1) == Some(&"=") && i + 2 < words.len() && is_identifier(word) {
                i += 2;
                (word.to_string(), words[i])
            } else if let Some((key, value)) = split_assignment(word) {
                if value.is_empty() && i + 1 < words.len() && split_assignment(words[i + 1]).is_none() {
                    i += 1;
                    (key.to_string(), words[i])
                } else {
                    (key.to_string(), value)
                }
            } else {
                let key = format!("arg{positional}");
                positional += 1;
                (key, word)
            };
            i += 1;

            if call.placeholder.is_none() && is_placeholder(raw_value) {
                call.placeholder = Some(key.clone());
            }
            let value = self.module_value(raw_value)?;
            call.args.insert(key, value);
        }

        if let Some(threads) = call.args.remove(THREADS_KEY) {
            call.workers = threads
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ShellError::invalid(format!("threads must be a positive integer, got '{threads}'"))
                })?;
        }
        if call.args.remove(SAVE_KEY).is_some() {
            debug!("ignoring 'save' argument");
        }
        if call.placeholder.as_deref().is_some_and(|k| !call.args.contains_key(k)) {
            call.placeholder = None;
        }
        Ok(call)
    }

    fn module_value(&self, raw: &str) -> ShellResult<String> {
        let mut cursor = Cursor::new(raw);
        if let Some(quote @ ('"' | '\'')) = cursor.peek() {
            let content = cursor.take_quoted()?;
            if cursor.is_eof() {
                return if quote == '"' {
                    self.expand(&content)
                } else {
                    Ok(self.resolver.bind_literal(&content))
                };
            }
        }
        self.expand(raw)
    }
}

impl Shell {
    /// Run module `name` with the raw argument text that followed it.
    ///
    /// Session variables fill in keys the command line did not set. Piped
    /// `input` is injected after parsing.
    pub(crate) async fn run_module(
        &self,
        name: &str,
        raw_args: &str,
        input: Option<String>,
    ) -> ShellResult<ModuleRun> {
        if !self.modules.contains(name) {
            return Err(ModuleError::NotFound(name.to_string()).into());
        }

        let mut call = self.interpreter().module_args(raw_args)?;
        if let Some(input) = input {
            call.inject(input);
        }
        for (key, value) in self.session().iter() {
            call.args
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }

        info!(module = name, workers = call.workers, "executing module");
        let result = if call.workers > 1 {
            run_fanout(Arc::clone(&self.modules), name, &call.args, call.workers).await?
        } else {
            self.modules.execute(name, &call.args).await?
        };
        info!(
            module = name,
            success = result.success,
            exit_code = result.exit_code,
            elapsed_ms = u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            "module finished"
        );

        Ok(ModuleRun {
            name: name.to_string(),
            args: call.args,
            workers: call.workers,
            result,
        })
    }
}
