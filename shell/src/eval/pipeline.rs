//! `stage |> stage |> ...` evaluation.

use super::call::parse_call_shape;
use crate::error::{ShellError, ShellResult};
use crate::scanner::{ident_len, Cursor};
use crate::shell::Shell;
use tracing::debug;

/// One pipeline stage, classified.
#[derive(Debug, PartialEq, Eq)]
enum Stage<'s> {
    /// Quoted text, escapes already processed.
    Literal(String),
    /// `name(args)`
    Call { name: &'s str, inner: &'s str },
    /// Registered builtin written without parentheses: `name args...`
    Builtin { name: &'s str, rest: &'s str },
    /// Anything else that starts with an identifier.
    Module { name: &'s str, rest: &'s str },
}

impl Shell {
    fn classify_stage<'s>(&self, stage: &'s str) -> ShellResult<Stage<'s>> {
        if stage.is_empty() {
            return Err(ShellError::parse("empty pipeline stage"));
        }

        if stage.starts_with(['"', '\'']) {
            let mut cursor = Cursor::new(stage);
            let literal = cursor.take_quoted()?;
            if !cursor.rest().trim().is_empty() {
                return Err(ShellError::parse(format!(
                    "unexpected text after literal in '{stage}'"
                )));
            }
            return Ok(Stage::Literal(literal));
        }

        if let Some((name, inner)) = parse_call_shape(stage)? {
            return Ok(Stage::Call { name, inner });
        }

        let name_len = ident_len(stage);
        let rest = &stage[name_len..];
        if name_len == 0 || !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
            return Err(ShellError::parse(format!("invalid pipeline stage '{stage}'")));
        }
        let name = &stage[..name_len];
        if self.builtins.contains(name) {
            Ok(Stage::Builtin { name, rest })
        } else {
            Ok(Stage::Module { name, rest })
        }
    }

    /// Run every stage left to right, threading output into the next one.
    ///
    /// The first failing stage aborts the rest and nothing is returned.
    pub(crate) async fn run_pipeline(&self, stages: &[&str]) -> ShellResult<String> {
        let mut carried: Option<String> = None;
        for (index, stage) in stages.iter().enumerate() {
            let output = self
                .run_stage(stage.trim(), carried.take())
                .await
                .map_err(|e| ShellError::PipelineStage {
                    stage: index + 1,
                    source: Box::new(e),
                })?;
            carried = Some(output);
        }
        Ok(carried.unwrap_or_default())
    }

    async fn run_stage(&self, stage: &str, input: Option<String>) -> ShellResult<String> {
        let stage = self.classify_stage(stage)?;
        debug!(?stage, has_input = input.is_some(), "pipeline stage");

        // Empty output carries nothing into calls and modules.
        let injected = input.clone().filter(|s| !s.is_empty());
        match stage {
            Stage::Literal(literal) => Ok(input.unwrap_or_default() + &self.bind(&literal)),
            Stage::Call { name, inner } => {
                if !self.builtins.contains(name) {
                    return Err(ShellError::UnknownBuiltin(name.to_string()));
                }
                self.call_with_input(name, inner, injected)
            }
            Stage::Builtin { name, rest } => self.call_with_input(name, rest, injected),
            Stage::Module { name, rest } => {
                let run = self.run_module(name, rest, injected).await?;
                if !run.result.success {
                    let detail = if run.result.error.trim().is_empty() {
                        run.result.output
                    } else {
                        run.result.error
                    };
                    return Err(ShellError::ModuleFailed {
                        name: run.name,
                        exit_code: run.result.exit_code,
                        detail,
                    });
                }
                Ok(run.result.output.trim().to_string())
            }
        }
    }

    fn call_with_input(&self, name: &str, raw_args: &str, input: Option<String>) -> ShellResult<String> {
        let interpreter = self.interpreter();
        let mut args = interpreter.split_arguments(raw_args)?;
        args.extend(input);
        interpreter.call(name, &args)
    }
}
