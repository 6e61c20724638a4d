//! modsh - interactive expression shell for running modular tools
//!
//! This crate provides:
//! - Builtin calls with nested evaluation: `toupper($(whoami))`
//! - Pipelines threading output between stages: `"abc" |> reverse`
//! - For-loops over numeric, character, IPv4, list and chained ranges
//! - Session variables overlaid on the process environment
//! - Module dispatch through a [`modsh_core::ModuleRunner`], with fan-out

pub mod builtins;
pub mod display;
pub mod error;
pub mod eval;
pub mod help;
pub mod range;
pub mod scanner;
pub mod scope;
pub mod shell;

pub use builtins::{Builtin, BuiltinFn, BuiltinRegistry};
pub use error::{ShellError, ShellResult};
pub use eval::{Command, Evaluation, Interpreter, LoopReport, ModuleRun};
pub use range::{parse_range_source, RangeIter};
pub use scope::{Resolver, SessionVars, VariableStore};
pub use shell::{Shell, ShellBuilder};
