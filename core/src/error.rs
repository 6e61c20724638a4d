use std::path::PathBuf;
use thiserror::Error;

pub type ModuleResult<T> = Result<T, ModuleError>;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module '{0}' not found")]
    NotFound(String),

    #[error("module '{0}' already exists")]
    AlreadyExists(String),

    #[error("invalid module name '{0}'")]
    InvalidName(String),

    #[error("this module source does not support {0}")]
    Unsupported(&'static str),

    #[error("module '{name}' failed to load: {reason}")]
    LoadFailed { name: String, reason: String },

    #[error("module '{module}' requires arguments: {}", .missing.join(", "))]
    MissingArguments { module: String, missing: Vec<String> },

    #[error("unsupported module type '{kind}' for '{name}' (supported: python, bash)")]
    UnsupportedType { name: String, kind: String },

    #[error("no entry point found in {dir}, expected {expected}")]
    NoEntryPoint { dir: PathBuf, expected: &'static str },

    #[error("failed to spawn '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        source: std::io::Error,
    },

    #[error("invalid module metadata: {0}")]
    Metadata(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModuleError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
