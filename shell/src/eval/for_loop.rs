//! `for VAR in RANGE -> COMMAND`

use super::Evaluation;
use crate::error::ShellResult;
use crate::range::parse_range_source;
use crate::scanner::substitute_with;
use crate::shell::Shell;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn for_loop_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^for\s+\$?(\w+)\s+(?:in\s+)?(.+?)\s*[-=]{1,2}>\s*(.+)$")
            .expect("static pattern")
    })
}

/// A parsed loop header and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForLoop<'l> {
    pub var: &'l str,
    pub source: &'l str,
    pub body: &'l str,
}

impl<'l> ForLoop<'l> {
    /// Recognise `for [$]VAR [in] RANGE -> COMMAND` (`=>` and `-->` also work).
    pub fn parse(line: &'l str) -> Option<Self> {
        let caps = for_loop_regex().captures(line.trim())?;
        Some(Self {
            var: caps.get(1)?.as_str(),
            source: caps.get(2)?.as_str().trim(),
            body: caps.get(3)?.as_str().trim(),
        })
    }
}

/// Replace `$var` and `${var}` in `template` with `value`, in one pass.
///
/// `$var` only matches when no identifier character follows, so `$x` does not
/// touch `$xy`. The inserted value is never scanned again.
pub fn substitute(template: &str, var: &str, value: &str) -> String {
    substitute_with(template, |name| (name == var).then_some(value))
}

/// One executed loop iteration.
#[derive(Debug)]
pub struct Iteration {
    /// 1-based position in the loop.
    pub index: usize,
    pub value: String,
    /// Body after substitution.
    pub command: String,
    /// The evaluation, or the one-line diagnostic it failed with.
    pub outcome: Result<Evaluation, String>,
}

impl Iteration {
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            Ok(eval) => eval.status() == 0,
            Err(_) => false,
        }
    }
}

/// Everything a loop did, in iteration order.
#[derive(Debug)]
pub struct LoopReport {
    pub var: String,
    pub source: String,
    /// `Len()` of the range before the first item; display only.
    pub estimated_len: usize,
    pub iterations: Vec<Iteration>,
}

impl LoopReport {
    /// Textual results of the iterations that produced one.
    pub fn results(&self) -> impl Iterator<Item = &str> {
        self.iterations.iter().filter_map(|it| match &it.outcome {
            Ok(eval) => eval.text().filter(|t| !t.is_empty()),
            Err(_) => None,
        })
    }

    pub fn failures(&self) -> usize {
        self.iterations.iter().filter(|it| !it.is_success()).count()
    }
}

impl Shell {
    /// Drive a loop to completion.
    ///
    /// A bad range fails before anything runs. Failing iterations are
    /// recorded and the loop moves on.
    pub(crate) async fn run_for_loop(&mut self, spec: &ForLoop<'_>) -> ShellResult<LoopReport> {
        // Ranges of nested loops may name outer loop variables.
        let source = self.bind(spec.source);
        let mut range = parse_range_source(&source)?;
        let mut report = LoopReport {
            var: spec.var.to_string(),
            source,
            estimated_len: range.estimated_len(),
            iterations: Vec::new(),
        };
        debug!(var = spec.var, source = %report.source, len = report.estimated_len, "starting loop");

        let mut index = 0;
        for value in range.by_ref() {
            index += 1;
            let command = substitute(spec.body, spec.var, &value);

            // Bound, not spliced: the value is never parsed as syntax.
            self.bindings.push((spec.var.to_string(), value.clone()));
            let outcome = self
                .dispatch_boxed(spec.body, true)
                .await
                .map_err(|e| e.to_string());
            self.bindings.pop();

            let iteration = Iteration {
                index,
                value,
                command,
                outcome,
            };
            if !iteration.is_success() {
                warn!(
                    index,
                    command = %iteration.command,
                    error = iteration.outcome.as_ref().err().map_or("non-zero exit", String::as_str),
                    "loop iteration failed"
                );
            }
            report.iterations.push(iteration);
        }
        range.close();

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_forms() {
        let l = ForLoop::parse("for x in 1..3 -> echo($x)").unwrap();
        assert_eq!((l.var, l.source, l.body), ("x", "1..3", "echo($x)"));

        let l = ForLoop::parse("for $ip 10.0.0.1..5 => ping $ip").unwrap();
        assert_eq!((l.var, l.source, l.body), ("ip", "10.0.0.1..5", "ping $ip"));

        let l = ForLoop::parse("FOR u in admin|root --> login user=$u").unwrap();
        assert_eq!((l.var, l.source), ("u", "admin|root"));

        assert!(ForLoop::parse("for x in 1..3").is_none());
        assert!(ForLoop::parse("format(x)").is_none());
    }

    #[test]
    fn substitution_is_single_pass() {
        assert_eq!(substitute("echo($x, ${x})", "x", "7"), "echo(7, 7)");
        assert_eq!(substitute("$xy $x", "x", "1"), "$xy 1");
        assert_eq!(substitute("$x", "x", "$x"), "$x");
        assert_eq!(substitute("cost $ 5", "x", "1"), "cost $ 5");
        assert_eq!(substitute("a$", "x", "1"), "a$");
    }
}
