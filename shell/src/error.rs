//! Error types for modsh

use modsh_core::ModuleError;
use thiserror::Error;

/// Result type alias for modsh operations
pub type ShellResult<T> = Result<T, ShellError>;

/// Error types for interpreter operations
#[derive(Error, Debug)]
pub enum ShellError {
    /// Unbalanced parentheses or quotes, malformed syntax
    #[error("Parse error: {0}")]
    Parse(String),

    /// Range specification that could not be parsed
    #[error("Cannot parse range '{spec}': {message}")]
    Range { spec: String, message: String },

    /// Evaluation was requested for a name that is not registered
    #[error("Unknown builtin: {0}")]
    UnknownBuiltin(String),

    /// A builtin ran and reported a failure
    #[error("{name}: {message}")]
    Builtin { name: String, message: String },

    /// Invalid argument passed to a builtin or command
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A pipeline stage failed; the remaining stages were skipped
    #[error("Pipe error at stage {stage}: {source}")]
    PipelineStage {
        stage: usize,
        source: Box<ShellError>,
    },

    /// A module ran but exited unsuccessfully
    #[error("module '{name}' failed (exit code {exit_code}){}", fmt_detail(.detail))]
    ModuleFailed {
        name: String,
        exit_code: i32,
        detail: String,
    },

    #[error(transparent)]
    Module(#[from] ModuleError),

    /// IO error (session file, shell passthrough, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Session file could not be encoded or decoded
    #[error("Session file error: {0}")]
    Session(#[from] serde_json::Error),
}

fn fmt_detail(detail: &str) -> String {
    let detail = detail.trim();
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", detail.lines().next().unwrap_or(detail))
    }
}

impl ShellError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
