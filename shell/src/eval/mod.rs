//! Line classification and evaluation.
//!
//! Every input line goes through [`Shell::classify`], which tries the forms
//! below in a fixed order and takes the first that matches:
//!
//! 1. `for VAR in RANGE -> COMMAND`
//! 2. pipeline, a top-level `|>`
//! 3. call, `name(args)` naming a registered builtin, or `$(...)`
//! 4. assignment, `NAME=value` or `NAME=?`
//! 5. `$ command` shell passthrough
//! 6. shell command, `module!`, or a module invocation

mod args;
mod call;
mod commands;
mod for_loop;
mod module;
mod pipeline;

pub use call::{parse_call_shape, Interpreter};
pub use commands::{format_module_info, ShellCommand};
pub use for_loop::{substitute, ForLoop, Iteration, LoopReport};
pub use module::{ModuleCall, ModuleRun};

use crate::error::{ShellError, ShellResult};
use crate::scanner::{contains_top_level, find_matching_paren, is_identifier, split_top_level, PIPE};
use crate::shell::Shell;
use modsh_core::ExecutionResult;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// A classified input line. Borrows from the line, never from the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'l> {
    Empty,
    ForLoop(ForLoop<'l>),
    Pipeline(Vec<&'l str>),
    Call { name: &'l str, inner: &'l str },
    /// `$(...)` on its own
    Inline(&'l str),
    Assign { name: &'l str, value: &'l str },
    ShowVar(&'l str),
    Passthrough(&'l str),
    Shell(ShellCommand<'l>),
    ModuleInfo(&'l str),
    Module { name: &'l str, args: &'l str },
}

/// What evaluating one line produced. Nothing is printed by the library.
#[derive(Debug)]
pub enum Evaluation {
    Empty,
    /// Result of a call or pipeline.
    Value(String),
    Loop(LoopReport),
    Assigned { name: String, value: String },
    Variable { name: String, value: Option<String> },
    Module(ModuleRun),
    /// Output of a `$ command` passthrough.
    Shell(ExecutionResult),
    /// Help, listings and other informational text.
    Text(String),
    /// A destructive command waiting for a yes. Running `command` performs it.
    Confirm { prompt: String, command: String },
    Clear,
    Exit,
}

impl Evaluation {
    /// The textual result, when there is one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Value(s) | Self::Text(s) => Some(s.as_str()),
            Self::Module(run) => Some(run.result.output.trim()),
            Self::Shell(result) => Some(result.output.trim_end()),
            Self::Assigned { value, .. } => Some(value.as_str()),
            Self::Variable { value, .. } => value.as_deref(),
            Self::Empty | Self::Loop(_) | Self::Confirm { .. } | Self::Clear | Self::Exit => None,
        }
    }

    /// Exit status in the shell sense: 0 is success.
    pub fn status(&self) -> i32 {
        match self {
            Self::Module(run) => run.result.exit_code,
            Self::Shell(result) => result.exit_code,
            Self::Loop(report) => i32::from(report.failures() > 0),
            _ => 0,
        }
    }
}

/// Split a line into its first word and the remainder.
fn first_word(line: &str) -> (&str, &str) {
    line.split_once(char::is_whitespace).unwrap_or((line, ""))
}

impl Shell {
    /// Decide what kind of line `line` is.
    ///
    /// An opening parenthesis that is never closed in a call-shaped line is a
    /// parse error; nothing is evaluated.
    pub fn classify<'l>(&self, line: &'l str) -> ShellResult<Command<'l>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Command::Empty);
        }

        if let Some(for_loop) = ForLoop::parse(line) {
            return Ok(Command::ForLoop(for_loop));
        }

        if contains_top_level(line, PIPE) {
            return Ok(Command::Pipeline(
                split_top_level(line, PIPE).into_iter().map(str::trim).collect(),
            ));
        }

        if let Some((name, inner)) = parse_call_shape(line)? {
            if self.builtins.contains(name) {
                return Ok(Command::Call { name, inner });
            }
        }
        if let Some(rest) = line.strip_prefix("$(") {
            let close = find_matching_paren(line, 2)
                .ok_or_else(|| ShellError::parse(format!("unbalanced parentheses in '{line}'")))?;
            if close != line.len() - 1 {
                return Err(ShellError::parse(format!(
                    "unexpected text after '{}' in '{line}'",
                    &line[..=close]
                )));
            }
            return Ok(Command::Inline(&rest[..rest.len() - 1]));
        }

        if !line.contains(char::is_whitespace) {
            if let Some((name, value)) = line.split_once('=') {
                if is_identifier(name) {
                    return Ok(if value == "?" {
                        Command::ShowVar(name)
                    } else {
                        Command::Assign { name, value }
                    });
                }
            }
        }

        if let Some(rest) = line.strip_prefix('$') {
            if rest.starts_with(char::is_whitespace) {
                return Ok(Command::Passthrough(rest.trim()));
            }
        }

        let (word, rest) = first_word(line);
        if let Some(cmd) = ShellCommand::parse(word, rest) {
            return Ok(Command::Shell(cmd));
        }
        if word == "run" {
            let (name, args) = first_word(rest.trim_start());
            if name.is_empty() {
                return Err(ShellError::invalid("usage: run MODULE [key=value ...]"));
            }
            return Ok(Command::Module { name, args });
        }
        if let Some(name) = word.strip_suffix('!') {
            return Ok(Command::ModuleInfo(name));
        }
        Ok(Command::Module { name: word, args: rest })
    }

    /// Evaluate one line of input and record it in the history.
    pub async fn execute(&mut self, line: &str) -> ShellResult<Evaluation> {
        let line = line.trim();
        if !line.is_empty() {
            self.history.push(line.to_string());
        }
        let result = self.dispatch(line, false).await;
        self.last_status = match &result {
            Ok(eval) => eval.status(),
            Err(_) => 1,
        };
        result
    }

    pub(crate) fn dispatch_boxed<'a>(
        &'a mut self,
        line: &'a str,
        in_loop: bool,
    ) -> Pin<Box<dyn Future<Output = ShellResult<Evaluation>> + Send + 'a>> {
        Box::pin(self.dispatch(line, in_loop))
    }

    async fn dispatch(&mut self, line: &str, in_loop: bool) -> ShellResult<Evaluation> {
        let command = self.classify(line)?;
        debug!(?command, in_loop, "dispatching");

        match command {
            Command::Empty => Ok(Evaluation::Empty),
            Command::ForLoop(spec) => self.run_for_loop(&spec).await.map(Evaluation::Loop),
            Command::Pipeline(stages) => self.run_pipeline(&stages).await.map(Evaluation::Value),
            Command::Call { name, inner } => {
                let interpreter = self.interpreter();
                let args = interpreter.split_arguments(inner)?;
                interpreter.call(name, &args).map(Evaluation::Value)
            }
            Command::Inline(inner) => self.interpreter().evaluate_inline(inner).map(Evaluation::Value),
            Command::Assign { .. } if in_loop => Err(ShellError::parse(
                "assignment is only allowed at top level",
            )),
            Command::Assign { name, value } => {
                self.session.set(name, value)?;
                Ok(Evaluation::Assigned {
                    name: name.to_string(),
                    value: value.to_string(),
                })
            }
            Command::ShowVar(name) => Ok(Evaluation::Variable {
                name: name.to_string(),
                value: self.session.get(name).map(str::to_string),
            }),
            Command::Passthrough(cmd) => self.run_passthrough(cmd).await.map(Evaluation::Shell),
            Command::Shell(_) if !self.bindings.is_empty() && line.contains('$') => {
                let bound = self.bind(line);
                let (word, rest) = first_word(bound.trim());
                match ShellCommand::parse(word, rest) {
                    Some(cmd) => self.run_command(cmd),
                    None => Err(ShellError::parse(format!("not a shell command: '{bound}'"))),
                }
            }
            Command::Shell(cmd) => self.run_command(cmd),
            Command::ModuleInfo(name) => self.module_info(&self.bind(name)).map(Evaluation::Text),
            Command::Module { name, args } => {
                let name = self.bind(name);
                self.run_module(&name, args, None).await.map(Evaluation::Module)
            }
        }
    }
}
