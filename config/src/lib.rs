//! modsh Configuration System
//!
//! Provides layered YAML configuration for the modsh shell.
//!
//! # Configuration Loading Priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/modsh/modsh.yaml` (system-wide)
//! 3. `~/.config/modsh/modsh.yaml` (user)
//! 4. `./modsh.yaml` (project-local)
//! 5. `MODSH_CONFIG=/path/to/config.yaml` (explicit)
//! 6. Environment variables (highest priority)
//!
//! # Example Configuration
//!
//! ```yaml
//! shell:
//!   prompt: "{cyan}modsh{reset} [{modules}]> "
//!   history:
//!     file: "~/.modsh_history"
//!
//! modules:
//!   dir: "${HOME}/modsh/modules"
//!   python: python3
//!
//! session:
//!   persist: true
//!
//! logging:
//!   level: debug
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{expand_path, ConfigLoader};
pub use types::*;

/// Load configuration from default locations.
///
/// Searches for config files in order and merges them.
/// Environment variables override file values.
pub fn load() -> Result<ModshConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<ModshConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}
