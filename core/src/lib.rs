//! Module management for modsh.
//!
//! A module is a directory holding an entry script (`main.py` or `main.sh`)
//! and an optional `module.yaml` describing its options. This crate discovers
//! modules, validates their arguments and runs them as subprocesses, either
//! once or fanned out across several concurrent workers.

#![allow(missing_docs)]

pub mod error;
pub mod fanout;
pub mod manager;
pub mod metadata;
pub mod runner;
pub mod scaffold;

pub use error::{ModuleError, ModuleResult};
pub use fanout::run_fanout;
pub use manager::{Interpreters, ModuleInfo, ModuleManager};
pub use metadata::{ModuleKind, ModuleMetadata, OptionMeta};
pub use runner::{ExecutionResult, ModuleArgs, ModuleRunner};
