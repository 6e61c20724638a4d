//! Variable scopes: session variables overlaid on the process environment.

use crate::error::ShellResult;
use crate::scanner::substitute_with;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read access to a set of variables.
pub trait VariableStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VariableStore for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl VariableStore for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

/// Variables set explicitly with `NAME=value`.
///
/// When backed by a file, every change is written through as pretty JSON.
#[derive(Debug, Default)]
pub struct SessionVars {
    vars: BTreeMap<String, String>,
    file: Option<PathBuf>,
}

impl SessionVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load variables from `file`, which also receives every later change.
    /// A missing or unreadable file starts an empty session.
    pub fn persistent(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let vars = match std::fs::read_to_string(&file) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %file.display(), error = %e, "ignoring malformed session file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %file.display(), error = %e, "cannot read session file");
                BTreeMap::new()
            }
        };
        debug!(path = %file.display(), count = vars.len(), "loaded session variables");
        Self {
            vars,
            file: Some(file),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Store `name`. When the session file cannot be written the previous
    /// value is restored and the error returned.
    pub fn set(&mut self, name: &str, value: &str) -> ShellResult<()> {
        let previous = self.vars.insert(name.to_string(), value.to_string());
        if let Err(e) = self.save() {
            match previous {
                Some(old) => self.vars.insert(name.to_string(), old),
                None => self.vars.remove(name),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Remove `name`, returning whether it was set. A failed save keeps it.
    pub fn unset(&mut self, name: &str) -> ShellResult<bool> {
        let Some(old) = self.vars.remove(name) else {
            return Ok(false);
        };
        if let Err(e) = self.save() {
            self.vars.insert(name.to_string(), old);
            return Err(e);
        }
        Ok(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    fn save(&self) -> ShellResult<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(file, serde_json::to_string_pretty(&self.vars)?)?;
        Ok(())
    }
}

impl VariableStore for SessionVars {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// A loop variable and its current value.
pub type Binding = (String, String);

/// Layered lookup: loop bindings (innermost first), then the session, then
/// the environment.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    bindings: &'a [Binding],
    session: &'a dyn VariableStore,
    env: &'a dyn VariableStore,
}

impl<'a> Resolver<'a> {
    pub fn new(session: &'a dyn VariableStore) -> Self {
        Self::with_env(session, &ProcessEnv)
    }

    pub fn with_env(session: &'a dyn VariableStore, env: &'a dyn VariableStore) -> Self {
        Self {
            bindings: &[],
            session,
            env,
        }
    }

    #[must_use]
    pub fn with_bindings(mut self, bindings: &'a [Binding]) -> Self {
        self.bindings = bindings;
        self
    }

    /// Value of a loop variable currently in scope.
    pub fn binding(&self, name: &str) -> Option<&'a str> {
        self.bindings
            .iter()
            .rev()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_bindings(&self) -> bool {
        !self.bindings.is_empty()
    }

    /// Substitute loop variables into literal text, leaving everything else.
    pub fn bind_literal(&self, text: &str) -> String {
        if self.bindings.is_empty() {
            return text.to_string();
        }
        substitute_with(text, |name| self.binding(name))
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        self.binding(name)
            .map(str::to_string)
            .or_else(|| self.session.get(name))
            .or_else(|| self.env.get(name))
    }

    /// Value of `name`, or `$name` unchanged when it is not set anywhere.
    pub fn resolve(&self, name: &str) -> String {
        self.lookup(name).unwrap_or_else(|| format!("${name}"))
    }
}
