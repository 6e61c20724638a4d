//! Shell state: session scope, builtins, modules and history.

use crate::builtins::BuiltinRegistry;
use crate::error::{ShellError, ShellResult};
use crate::eval::Interpreter;
use crate::scope::{Binding, Resolver, SessionVars};
use async_trait::async_trait;
use modsh_core::{ExecutionResult, ModuleArgs, ModuleError, ModuleInfo, ModuleResult, ModuleRunner};
use std::sync::Arc;

pub struct Shell {
    pub(crate) session: SessionVars,
    pub(crate) builtins: Arc<BuiltinRegistry>,
    pub(crate) modules: Arc<dyn ModuleRunner>,
    pub(crate) history: Vec<String>,
    pub(crate) last_status: i32,
    /// Loop variables of the iterations currently running, outermost first.
    pub(crate) bindings: Vec<Binding>,
}

impl Shell {
    /// A shell with the default builtins and no modules.
    pub fn new() -> Self {
        ShellBuilder::new().build()
    }

    pub fn builder() -> ShellBuilder {
        ShellBuilder::new()
    }

    pub fn session(&self) -> &SessionVars {
        &self.session
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    pub fn modules(&self) -> &Arc<dyn ModuleRunner> {
        &self.modules
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Status of the last executed line, 0 on success.
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Set a session variable
    pub fn set_var(&mut self, name: &str, value: &str) -> ShellResult<()> {
        if !crate::scanner::is_identifier(name) {
            return Err(ShellError::invalid(format!("invalid variable name '{name}'")));
        }
        self.session.set(name, value)
    }

    /// Get a session variable
    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.session.get(name)
    }

    /// Call evaluator over this shell's builtins and scope.
    pub fn interpreter(&self) -> Interpreter<'_> {
        Interpreter::new(
            &self.builtins,
            Resolver::new(&self.session).with_bindings(&self.bindings),
        )
    }

    /// `text` with the loop variables in scope substituted.
    pub(crate) fn bind(&self, text: &str) -> String {
        self.interpreter().resolver().bind_literal(text)
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

/// Runner used when no modules directory is configured.
struct NoModules;

#[async_trait]
impl ModuleRunner for NoModules {
    fn module(&self, _name: &str) -> Option<ModuleInfo> {
        None
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        Vec::new()
    }

    fn refresh(&self) -> ModuleResult<usize> {
        Ok(0)
    }

    async fn execute(&self, name: &str, _args: &ModuleArgs) -> ModuleResult<ExecutionResult> {
        Err(ModuleError::NotFound(name.to_string()))
    }
}

pub struct ShellBuilder {
    builtins: BuiltinRegistry,
    modules: Arc<dyn ModuleRunner>,
    session: SessionVars,
}

impl ShellBuilder {
    pub fn new() -> Self {
        Self {
            builtins: BuiltinRegistry::with_defaults(),
            modules: Arc::new(NoModules),
            session: SessionVars::new(),
        }
    }

    /// Register (or replace) a builtin.
    pub fn builtin<F>(mut self, name: &str, description: &str, f: F) -> Self
    where
        F: Fn(&[String]) -> ShellResult<String> + Send + Sync + 'static,
    {
        self.builtins.register(name, description, name, f);
        self
    }

    /// Replace the whole builtin table.
    pub fn builtins(mut self, builtins: BuiltinRegistry) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn modules(mut self, runner: Arc<dyn ModuleRunner>) -> Self {
        self.modules = runner;
        self
    }

    pub fn session(mut self, session: SessionVars) -> Self {
        self.session = session;
        self
    }

    /// Preset a session variable. In-memory sessions never fail to store.
    pub fn var(mut self, name: &str, value: &str) -> Self {
        if let Err(e) = self.session.set(name, value) {
            tracing::warn!(name, error = %e, "could not store session variable");
        }
        self
    }

    pub fn build(self) -> Shell {
        Shell {
            session: self.session,
            builtins: Arc::new(self.builtins),
            modules: self.modules,
            history: Vec::new(),
            last_status: 0,
            bindings: Vec::new(),
        }
    }
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self::new()
    }
}
