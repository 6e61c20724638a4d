//! Module authoring: create, inspect and remove module directories.

use crate::error::{ModuleError, ModuleResult};
use crate::manager::ModuleManager;
use crate::metadata::ModuleKind;
use crate::runner::ModuleRunner;
use std::path::{Path, PathBuf};
use tracing::info;

const METADATA_TEMPLATE: &str = r#"name: {name}
description: "Description of your module"
type: {kind}
author: Your Name
version: 1.0.0
tags:
  - custom
options:
  target:
    type: string
    description: Target parameter
    required: true
required:
  - target
"#;

const PYTHON_TEMPLATE: &str = r#"#!/usr/bin/env python3
"""
Module: {name}
"""

import os
import sys


def main():
    target = os.getenv("ARG_TARGET") or "localhost"
    print(f"[*] Module executing on {target}")
    try:
        print("[+] Module completed successfully!")
    except Exception as e:
        print(f"[!] Error: {e}")
        sys.exit(1)


if __name__ == "__main__":
    main()
"#;

const BASH_TEMPLATE: &str = r#"#!/bin/bash
# Module: {name}

TARGET="${ARG_TARGET:-localhost}"

echo "[*] Module executing on $TARGET"

echo "[+] Module completed successfully!"
"#;

/// A module name must be a single plain path component.
fn validate_name(name: &str) -> ModuleResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ModuleError::InvalidName(name.to_string()))
    }
}

fn script_template(kind: &ModuleKind) -> Option<&'static str> {
    match kind {
        ModuleKind::Python => Some(PYTHON_TEMPLATE),
        ModuleKind::Bash => Some(BASH_TEMPLATE),
        ModuleKind::Other(_) => None,
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl ModuleManager {
    /// Scaffold `name` with a `module.yaml` and an entry script for `kind`,
    /// then re-scan. Returns the new module directory.
    pub fn create_module(&self, name: &str, kind: &ModuleKind) -> ModuleResult<PathBuf> {
        validate_name(name)?;
        let (Some(template), Some(entry)) = (script_template(kind), kind.entry_point()) else {
            return Err(ModuleError::UnsupportedType {
                name: name.to_string(),
                kind: kind.to_string(),
            });
        };

        let dir = self.modules_dir().join(name);
        if dir.exists() {
            return Err(ModuleError::AlreadyExists(name.to_string()));
        }
        std::fs::create_dir_all(&dir)?;

        let metadata = METADATA_TEMPLATE
            .replace("{name}", name)
            .replace("{kind}", kind.as_str());
        std::fs::write(dir.join("module.yaml"), metadata)?;

        let script = dir.join(entry);
        std::fs::write(&script, template.replace("{name}", name))?;
        make_executable(&script)?;

        info!(module = name, kind = %kind, dir = %dir.display(), "created module");
        self.discover()?;
        Ok(dir)
    }

    /// Files of a module, relative to its directory, one level of
    /// subdirectories deep, sorted. Directories end with `/`.
    pub fn module_files(&self, name: &str) -> ModuleResult<Vec<String>> {
        let module = self
            .module(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;

        let mut files = Vec::new();
        for entry in sorted_entries(&module.path)? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() {
                files.push(format!("{file_name}/"));
                for sub in sorted_entries(&entry.path())? {
                    files.push(format!("{file_name}/{}", sub.file_name().to_string_lossy()));
                }
            } else {
                files.push(file_name);
            }
        }
        Ok(files)
    }

    /// Remove a module directory and re-scan. Returns the removed path.
    pub fn delete_module(&self, name: &str) -> ModuleResult<PathBuf> {
        let module = self
            .module(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;
        std::fs::remove_dir_all(&module.path)?;
        info!(module = name, dir = %module.path.display(), "deleted module");
        self.discover()?;
        Ok(module.path)
    }
}

fn sorted_entries(dir: &Path) -> ModuleResult<Vec<std::fs::DirEntry>> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(std::fs::DirEntry::file_name);
    Ok(entries)
}
