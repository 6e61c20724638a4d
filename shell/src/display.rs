//! Terminal rendering of evaluation results.

use crate::eval::{Evaluation, LoopReport, ModuleRun};
use modsh_core::ExecutionResult;
use std::fmt::Write;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Renders evaluations, optionally with ANSI colours.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Text to print for `eval`, or `None` when there is nothing to show.
    pub fn render(&self, eval: &Evaluation) -> Option<String> {
        let text = match eval {
            Evaluation::Empty | Evaluation::Clear | Evaluation::Exit => return None,
            Evaluation::Value(value) => value.clone(),
            Evaluation::Text(text) => text.trim_end().to_string(),
            Evaluation::Loop(report) => self.render_loop(report),
            Evaluation::Assigned { name, value } => {
                format!("Set {} = {}", self.paint(CYAN, name), self.paint(GREEN, value))
            }
            Evaluation::Variable { name, value: Some(value) } => {
                format!("{} = {}", self.paint(CYAN, name), self.paint(GREEN, value))
            }
            Evaluation::Variable { name, value: None } => {
                self.paint(YELLOW, &format!("Variable '{name}' not set"))
            }
            Evaluation::Module(run) => self.render_module(run),
            Evaluation::Shell(result) => self.render_output(result),
            Evaluation::Confirm { prompt, command } => format!(
                "{}\n{}",
                self.paint(YELLOW, prompt.trim_end()),
                self.paint(DIM, &format!("Not confirmed. Run '{command}' to proceed."))
            ),
        };
        Some(text)
    }

    fn render_output(&self, result: &ExecutionResult) -> String {
        let mut out = result.output.trim_end().to_string();
        for line in result.error.lines().filter(|l| !l.is_empty()) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&self.paint(RED, line));
        }
        out
    }

    fn render_module(&self, run: &ModuleRun) -> String {
        let mut out = String::new();
        let body = self.render_output(&run.result);
        if !body.is_empty() {
            out.push_str(&body);
            out.push('\n');
        }

        let threads = if run.workers > 1 {
            format!(", {} workers", run.workers)
        } else {
            String::new()
        };
        let summary = format!(
            "{} {} in {:.2?} [exit: {}{threads}]",
            run.name,
            if run.result.success { "completed" } else { "failed" },
            run.result.duration,
            run.result.exit_code,
        );
        let code = if run.result.success { GREEN } else { RED };
        out.push_str(&self.paint(code, &summary));
        out
    }

    fn render_loop(&self, report: &LoopReport) -> String {
        let mut out = format!(
            "Loop: {} in {} ({} items)\n",
            self.paint(CYAN, &report.var),
            report.source,
            report.estimated_len
        );
        if report.iterations.is_empty() {
            out.push_str(&self.paint(YELLOW, "Empty range, nothing to do"));
            return out;
        }

        let total = report.iterations.len();
        for it in &report.iterations {
            let _ = writeln!(out, "  [{:>3}/{total:>3}] {}", it.index, self.paint(DIM, &it.command));
            match &it.outcome {
                Ok(eval) => {
                    if let Some(text) = self.render(eval) {
                        for line in text.lines() {
                            let _ = writeln!(out, "            {line}");
                        }
                    }
                }
                Err(e) => {
                    let _ = writeln!(out, "            {}", self.paint(RED, e));
                }
            }
        }

        let failures = report.failures();
        let summary = format!("{total} iterations, {failures} failed");
        let code = if failures == 0 { GREEN } else { YELLOW };
        out.push_str(&self.paint(code, &summary));
        out
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(true)
    }
}
