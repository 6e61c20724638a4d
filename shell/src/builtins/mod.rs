//! Builtin function registry.
//!
//! Every builtin shares one contract: a slice of evaluated argument strings in,
//! one result string out. Arity and argument meaning vary per builtin and are
//! checked by the builtin itself.

mod convert;
mod encoding;
mod files;
mod hash;
mod math;
mod net;
mod system;
mod text;
mod time;
mod validate;

use crate::error::{ShellError, ShellResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Callback type for builtins
pub type BuiltinFn = Arc<dyn Fn(&[String]) -> ShellResult<String> + Send + Sync>;

#[derive(Clone)]
pub struct Builtin {
    pub name: String,
    pub description: String,
    pub usage: String,
    callback: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Name-keyed builtin table. Built once, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct BuiltinRegistry {
    builtins: BTreeMap<String, Builtin>,
}

impl BuiltinRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every default builtin.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        text::register(&mut registry);
        encoding::register(&mut registry);
        hash::register(&mut registry);
        convert::register(&mut registry);
        validate::register(&mut registry);
        net::register(&mut registry);
        math::register(&mut registry);
        system::register(&mut registry);
        time::register(&mut registry);
        files::register(&mut registry);
        registry
    }

    /// Register (or replace) a builtin.
    pub fn register<F>(&mut self, name: &str, description: &str, usage: &str, callback: F)
    where
        F: Fn(&[String]) -> ShellResult<String> + Send + Sync + 'static,
    {
        self.builtins.insert(
            name.to_string(),
            Builtin {
                name: name.to_string(),
                description: description.to_string(),
                usage: usage.to_string(),
                callback: Arc::new(callback),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.builtins.get(name)
    }

    /// Builtins in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Builtin> {
        self.builtins.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builtins.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.builtins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builtins.is_empty()
    }

    /// Run `name` with `args`. Failures come back as [`ShellError::Builtin`]
    /// naming the builtin.
    pub fn execute(&self, name: &str, args: &[String]) -> ShellResult<String> {
        let builtin = self
            .builtins
            .get(name)
            .ok_or_else(|| ShellError::UnknownBuiltin(name.to_string()))?;

        trace!(builtin = name, ?args, "executing builtin");
        (builtin.callback)(args).map_err(|e| match e {
            e @ ShellError::Builtin { .. } => e,
            ShellError::InvalidArgument(message) => ShellError::Builtin {
                name: name.to_string(),
                message,
            },
            other => ShellError::Builtin {
                name: name.to_string(),
                message: other.to_string(),
            },
        })
    }
}

/// Largest result a builtin may build, in bytes.
pub(crate) const MAX_OUTPUT_BYTES: usize = 16 * 1024 * 1024;

/// All arguments as one space-separated string.
pub(crate) fn joined(args: &[String]) -> String {
    args.join(" ")
}

/// First argument, trimmed, or empty when there is none.
pub(crate) fn first(args: &[String]) -> &str {
    args.first().map_or("", |s| s.trim())
}

/// Fail unless at least `n` arguments were supplied.
pub(crate) fn require(args: &[String], n: usize, usage: &str) -> ShellResult<()> {
    if args.len() < n {
        return Err(ShellError::invalid(format!("usage: {usage}")));
    }
    Ok(())
}

pub(crate) fn parse_int(s: &str) -> ShellResult<i64> {
    s.trim()
        .parse()
        .map_err(|_| ShellError::invalid(format!("not an integer: '{s}'")))
}

pub(crate) fn parse_number(s: &str) -> ShellResult<f64> {
    s.trim()
        .parse()
        .map_err(|_| ShellError::invalid(format!("not a number: '{s}'")))
}

/// Render a float without a trailing `.0` when it holds an integer.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

pub(crate) fn bool_str(b: bool) -> String {
    b.to_string()
}

#[cfg(test)]
pub(crate) fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}
