//! Shell commands (`help`, `list`, `env`, ...) and `$ command` passthrough.

use super::Evaluation;
use crate::error::{ShellError, ShellResult};
use crate::help::{format_builtin_help, format_help, format_help_list, get_help};
use crate::shell::Shell;
use modsh_core::{ExecutionResult, ModuleError, ModuleInfo, ModuleKind};
use std::fmt::Write;
use std::process::Stdio;
use std::time::Instant;
use tracing::{debug, info};

/// A built-in shell command, identified by its first word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand<'l> {
    Help(Option<&'l str>),
    List,
    Search(&'l str),
    Info(&'l str),
    Env,
    Unset(&'l str),
    History,
    Refresh,
    /// `create NAME [python|bash]`
    Create { name: &'l str, kind: Option<&'l str> },
    Edit(&'l str),
    /// `delete NAME [--yes]`; unconfirmed deletes ask first.
    Delete { name: &'l str, confirmed: bool },
    Clear,
    Exit,
}

impl<'l> ShellCommand<'l> {
    /// Match `word` (the first word of the line) with the rest as argument.
    pub fn parse(word: &str, rest: &'l str) -> Option<Self> {
        let arg = rest.trim();
        let first = arg.split_whitespace().next().unwrap_or("");
        let cmd = match word {
            "help" | "h" | "?" => Self::Help(Some(first).filter(|s| !s.is_empty())),
            "list" | "ls" => Self::List,
            "search" => Self::Search(arg),
            "info" => Self::Info(first),
            "env" | "envs" => Self::Env,
            "unset" => Self::Unset(first),
            "history" => Self::History,
            "refresh" | "reload" => Self::Refresh,
            "create" | "new" => Self::Create {
                name: first,
                kind: arg.split_whitespace().nth(1),
            },
            "edit" => Self::Edit(first),
            "delete" | "remove" | "rm" => Self::Delete {
                name: first,
                confirmed: arg.split_whitespace().skip(1).any(|w| w == "--yes" || w == "-y"),
            },
            "clear" | "cls" => Self::Clear,
            "exit" | "quit" | "q" => Self::Exit,
            _ => return None,
        };
        Some(cmd)
    }
}

/// `dir/file` entries of a module listing; `dir/` itself is top level.
fn is_nested(entry: &str) -> bool {
    entry
        .trim_end_matches('/')
        .contains('/')
}

fn require<'a>(value: &'a str, usage: &str) -> ShellResult<&'a str> {
    if value.is_empty() {
        Err(ShellError::invalid(format!("usage: {usage}")))
    } else {
        Ok(value)
    }
}

/// Multi-line description of one module.
pub fn format_module_info(module: &ModuleInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", module.name, module.kind);
    let _ = writeln!(out, "  path: {}", module.path.display());
    if let Some(err) = &module.load_error {
        let _ = writeln!(out, "  load error: {err}");
    }

    let Some(meta) = &module.metadata else {
        return out;
    };
    if !meta.description.is_empty() {
        let _ = writeln!(out, "  description: {}", meta.description);
    }
    if !meta.author.is_empty() {
        let _ = writeln!(out, "  author: {}", meta.author);
    }
    if !meta.version.is_empty() {
        let _ = writeln!(out, "  version: {}", meta.version);
    }
    if !meta.tags.is_empty() {
        let _ = writeln!(out, "  tags: {}", meta.tags.join(", "));
    }

    if !meta.options.is_empty() {
        let required = meta.required_options();
        out.push_str("  options:\n");
        for (name, opt) in &meta.options {
            let marker = if required.contains(name) { "*" } else { " " };
            let _ = write!(out, "   {marker} {name:16} {:8} {}", opt.kind, opt.description);
            if !opt.default.is_empty() {
                let _ = write!(out, " (default: {})", opt.default);
            }
            out.push('\n');
        }
    }
    out
}

fn format_module_row(module: &ModuleInfo) -> String {
    let summary = module
        .load_error
        .as_ref()
        .map_or_else(|| module.description().to_string(), |e| format!("[load error] {e}"));
    format!("  {:20} {:8} {}", module.name, module.kind.as_str(), summary)
}

impl Shell {
    pub(crate) fn run_command(&mut self, cmd: ShellCommand<'_>) -> ShellResult<Evaluation> {
        debug!(?cmd, "shell command");
        let text = match cmd {
            ShellCommand::Help(None) => format_help_list(&self.builtins),
            ShellCommand::Help(Some(name)) => self.help_for(name)?,
            ShellCommand::List => {
                let modules = self.modules.modules();
                if modules.is_empty() {
                    "No modules found".to_string()
                } else {
                    let mut out = format!("{} modules:\n", modules.len());
                    for module in &modules {
                        let _ = writeln!(out, "{}", format_module_row(module));
                    }
                    out
                }
            }
            ShellCommand::Search(keyword) => {
                let keyword = require(keyword, "search KEYWORD")?.to_lowercase();
                let found: Vec<String> = self
                    .modules
                    .modules()
                    .iter()
                    .filter(|m| {
                        m.name.to_lowercase().contains(&keyword)
                            || m.description().to_lowercase().contains(&keyword)
                            || m.tags().iter().any(|t| t.to_lowercase().contains(&keyword))
                    })
                    .map(format_module_row)
                    .collect();
                if found.is_empty() {
                    format!("No modules match '{keyword}'")
                } else {
                    found.join("\n")
                }
            }
            ShellCommand::Info(name) => {
                let name = require(name, "info MODULE")?;
                self.module_info(name)?
            }
            ShellCommand::Env => {
                if self.session.is_empty() {
                    "No session variables set".to_string()
                } else {
                    self.session
                        .iter()
                        .map(|(k, v)| format!("  {k} = {v}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            ShellCommand::Unset(name) => {
                let name = require(name, "unset NAME")?;
                if self.session.unset(name)? {
                    format!("Unset {name}")
                } else {
                    format!("Variable '{name}' not set")
                }
            }
            ShellCommand::History => self
                .history
                .iter()
                .enumerate()
                .map(|(i, line)| format!("{:5}  {line}", i + 1))
                .collect::<Vec<_>>()
                .join("\n"),
            ShellCommand::Refresh => {
                let count = self.modules.refresh()?;
                info!(count, "modules refreshed");
                format!("Loaded {count} modules")
            }
            ShellCommand::Create { name, kind } => {
                let name = require(name, "create NAME [python|bash]")?;
                let kind = match kind.unwrap_or("python") {
                    kind @ ("python" | "bash") => ModuleKind::from_type(kind),
                    other => {
                        return Err(ShellError::invalid(format!(
                            "unsupported module type '{other}', expected python or bash"
                        )))
                    }
                };
                let dir = self.modules.create(name, &kind)?;
                format!(
                    "Module '{name}' created ({kind})\n  location: {}\n  edit module.yaml and {} to implement it",
                    dir.display(),
                    kind.entry_point().unwrap_or("the entry script"),
                )
            }
            ShellCommand::Edit(name) => {
                let name = require(name, "edit NAME")?;
                self.edit_listing(name)?
            }
            ShellCommand::Delete { name, confirmed: false } => {
                let name = require(name, "delete NAME [--yes]")?;
                if !self.modules.contains(name) {
                    return Err(ModuleError::NotFound(name.to_string()).into());
                }
                return Ok(Evaluation::Confirm {
                    prompt: format!("Delete module '{name}' and all its files? (yes/no): "),
                    command: format!("delete {name} --yes"),
                });
            }
            ShellCommand::Delete { name, confirmed: true } => {
                let name = require(name, "delete NAME [--yes]")?;
                let dir = self.modules.delete(name)?;
                info!(module = name, "module deleted");
                format!("Module '{name}' deleted ({})", dir.display())
            }
            ShellCommand::Clear => return Ok(Evaluation::Clear),
            ShellCommand::Exit => return Ok(Evaluation::Exit),
        };
        Ok(Evaluation::Text(text))
    }

    fn help_for(&self, name: &str) -> ShellResult<String> {
        if let Some(cmd) = get_help(name) {
            return Ok(format_help(cmd));
        }
        if let Some(builtin) = self.builtins.get(name) {
            return Ok(format_builtin_help(builtin));
        }
        if let Some(module) = self.modules.module(name) {
            return Ok(format_module_info(&module));
        }
        Err(ShellError::invalid(format!("no help for '{name}'")))
    }

    /// File tree of a module with the editor command to open it.
    fn edit_listing(&self, name: &str) -> ShellResult<String> {
        let module = self
            .modules
            .module(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;
        let files = self.modules.files(name)?;

        let mut out = format!("{name}/\n");
        let top_level: Vec<&String> = files.iter().filter(|f| !is_nested(f)).collect();
        for (i, file) in top_level.iter().enumerate() {
            let last = i + 1 == top_level.len();
            let _ = writeln!(out, "  {} {file}", if last { "└─" } else { "├─" });
            if let Some(dir) = file.strip_suffix('/') {
                let prefix = format!("{dir}/");
                let children: Vec<&str> = files
                    .iter()
                    .filter_map(|f| f.strip_prefix(&prefix))
                    .filter(|f| !f.is_empty())
                    .collect();
                let indent = if last { "   " } else { "│  " };
                for (j, child) in children.iter().enumerate() {
                    let branch = if j + 1 == children.len() { "└─" } else { "├─" };
                    let _ = writeln!(out, "  {indent} {branch} {child}");
                }
            }
        }

        let editor = std::env::var("EDITOR")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "nano".to_string());
        let _ = write!(out, "\nOpen with: {editor} {}", module.path.display());
        Ok(out)
    }

    pub(crate) fn module_info(&self, name: &str) -> ShellResult<String> {
        self.modules
            .module(name)
            .map(|m| format_module_info(&m))
            .ok_or_else(|| ModuleError::NotFound(name.to_string()).into())
    }

    /// Run `command` with `sh -c`, capturing its output.
    pub(crate) async fn run_passthrough(&self, command: &str) -> ShellResult<ExecutionResult> {
        let command = command.trim();
        if command.is_empty() {
            return Err(ShellError::invalid("usage: $ COMMAND"));
        }
        debug!(command, "shell passthrough");

        let started = Instant::now();
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .envs(self.bindings.iter().cloned())
            .stdin(Stdio::null())
            .output()
            .await?;
        let exit_code = output.status.code().unwrap_or(-1);

        Ok(ExecutionResult {
            success: output.status.success(),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
            error: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
            duration: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ShellBuilder;

    #[test]
    fn command_words() {
        assert_eq!(ShellCommand::parse("h", ""), Some(ShellCommand::Help(None)));
        assert_eq!(
            ShellCommand::parse("help", " sha256 "),
            Some(ShellCommand::Help(Some("sha256")))
        );
        assert_eq!(
            ShellCommand::parse("search", " web scan"),
            Some(ShellCommand::Search("web scan"))
        );
        assert_eq!(ShellCommand::parse("quit", ""), Some(ShellCommand::Exit));
        assert_eq!(
            ShellCommand::parse("new", " sweep bash"),
            Some(ShellCommand::Create { name: "sweep", kind: Some("bash") })
        );
        assert_eq!(
            ShellCommand::parse("rm", " old -y"),
            Some(ShellCommand::Delete { name: "old", confirmed: true })
        );
        assert_eq!(
            ShellCommand::parse("delete", " old"),
            Some(ShellCommand::Delete { name: "old", confirmed: false })
        );
        assert_eq!(ShellCommand::parse("portscan", ""), None);
    }

    #[test]
    fn env_and_unset() {
        let mut shell = ShellBuilder::new().var("lhost", "10.0.0.5").build();
        let Evaluation::Text(text) = shell.run_command(ShellCommand::Env).unwrap() else {
            panic!("expected text");
        };
        assert!(text.contains("lhost = 10.0.0.5"));

        shell.run_command(ShellCommand::Unset("lhost")).unwrap();
        assert!(shell.get_var("lhost").is_none());
        assert!(shell.run_command(ShellCommand::Unset("")).is_err());
    }

    #[test]
    fn help_covers_builtins() {
        let mut shell = ShellBuilder::new().build();
        let Evaluation::Text(text) = shell.run_command(ShellCommand::Help(Some("rot13"))).unwrap() else {
            panic!("expected text");
        };
        assert!(text.starts_with("rot13 - "));
        assert!(shell.run_command(ShellCommand::Help(Some("zzz"))).is_err());
    }

    #[tokio::test]
    async fn passthrough_captures_output() {
        let shell = ShellBuilder::new().build();
        let result = shell.run_passthrough("echo hi; exit 3").await.unwrap();
        assert_eq!(result.output, "hi\n");
        assert_eq!(result.exit_code, 3);
        assert!(!result.success);
    }
}
