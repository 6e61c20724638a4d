use crate::error::{ModuleError, ModuleResult};
use crate::metadata::{ModuleKind, ModuleMetadata};
use crate::runner::{run_script, ExecutionResult, ModuleArgs, ModuleRunner};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};

const METADATA_FILE: &str = "module.yaml";

/// A discovered module directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub path: PathBuf,
    pub kind: ModuleKind,
    pub metadata: Option<ModuleMetadata>,
    pub load_error: Option<String>,
}

impl ModuleInfo {
    pub fn is_loaded(&self) -> bool {
        self.load_error.is_none()
    }

    pub fn description(&self) -> &str {
        self.metadata
            .as_ref()
            .map_or("", |meta| meta.description.as_str())
    }

    pub fn tags(&self) -> &[String] {
        self.metadata.as_ref().map_or(&[], |meta| meta.tags.as_slice())
    }

    /// Required options absent from `args`.
    pub fn missing_required(&self, args: &ModuleArgs) -> Vec<String> {
        self.metadata
            .as_ref()
            .map(|meta| {
                meta.required_options()
                    .into_iter()
                    .filter(|name| !args.contains_key(name))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Interpreter commands per module kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreters {
    pub python: String,
    pub bash: String,
}

impl Default for Interpreters {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            bash: "bash".to_string(),
        }
    }
}

impl Interpreters {
    fn for_kind(&self, kind: &ModuleKind) -> Option<&str> {
        match kind {
            ModuleKind::Python => Some(self.python.as_str()),
            ModuleKind::Bash => Some(self.bash.as_str()),
            ModuleKind::Other(_) => None,
        }
    }
}

/// Filesystem-backed module registry.
///
/// Reads vastly outnumber writes (only `refresh` writes), so the table sits
/// behind an `RwLock` and can be shared with fan-out workers.
pub struct ModuleManager {
    modules_dir: PathBuf,
    interpreters: Interpreters,
    modules: RwLock<BTreeMap<String, ModuleInfo>>,
}

impl ModuleManager {
    pub fn new(modules_dir: impl Into<PathBuf>, interpreters: Interpreters) -> Self {
        Self {
            modules_dir: modules_dir.into(),
            interpreters,
            modules: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    /// Scan the modules directory, creating it if missing.
    pub fn discover(&self) -> ModuleResult<usize> {
        std::fs::create_dir_all(&self.modules_dir)?;

        let mut found = BTreeMap::new();
        for entry in std::fs::read_dir(&self.modules_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let module = Self::load_module_dir(&entry.path());
            if let Some(reason) = &module.load_error {
                warn!(module = %module.name, %reason, "module failed to load");
            }
            found.insert(module.name.clone(), module);
        }

        let count = found.len();
        *self.modules.write().unwrap_or_else(PoisonError::into_inner) = found;
        info!(dir = %self.modules_dir.display(), count, "discovered modules");
        Ok(count)
    }

    fn load_module_dir(dir: &Path) -> ModuleInfo {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let metadata_path = dir.join(METADATA_FILE);
        if metadata_path.exists() {
            match ModuleMetadata::load(&metadata_path) {
                Ok(metadata) => {
                    let kind = if metadata.kind.is_empty() {
                        Self::infer_kind(dir)
                    } else {
                        ModuleKind::from_type(&metadata.kind)
                    };
                    ModuleInfo {
                        name,
                        path: dir.to_path_buf(),
                        kind,
                        metadata: Some(metadata),
                        load_error: None,
                    }
                }
                Err(e) => ModuleInfo {
                    name,
                    path: dir.to_path_buf(),
                    kind: Self::infer_kind(dir),
                    metadata: None,
                    load_error: Some(e.to_string()),
                },
            }
        } else {
            ModuleInfo {
                name,
                path: dir.to_path_buf(),
                kind: Self::infer_kind(dir),
                metadata: None,
                load_error: None,
            }
        }
    }

    fn infer_kind(dir: &Path) -> ModuleKind {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return ModuleKind::Other("unknown".to_string());
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();

        if names.iter().any(|n| n.ends_with(".py")) {
            ModuleKind::Python
        } else if names.iter().any(|n| n.ends_with(".sh")) {
            ModuleKind::Bash
        } else {
            ModuleKind::Other("unknown".to_string())
        }
    }

    /// A module that is present and loaded cleanly.
    fn loaded(&self, name: &str) -> ModuleResult<ModuleInfo> {
        let module = self
            .module(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;
        if let Some(reason) = &module.load_error {
            return Err(ModuleError::LoadFailed {
                name: name.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(module)
    }
}

#[async_trait]
impl ModuleRunner for ModuleManager {
    fn module(&self, name: &str) -> Option<ModuleInfo> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn refresh(&self) -> ModuleResult<usize> {
        self.discover()
    }

    fn create(&self, name: &str, kind: &ModuleKind) -> ModuleResult<PathBuf> {
        self.create_module(name, kind)
    }

    fn files(&self, name: &str) -> ModuleResult<Vec<String>> {
        self.module_files(name)
    }

    fn delete(&self, name: &str) -> ModuleResult<PathBuf> {
        self.delete_module(name)
    }

    async fn execute(&self, name: &str, args: &ModuleArgs) -> ModuleResult<ExecutionResult> {
        let module = self.loaded(name)?;

        let missing = module.missing_required(args);
        if !missing.is_empty() {
            return Err(ModuleError::MissingArguments {
                module: name.to_string(),
                missing,
            });
        }

        let (Some(interpreter), Some(entry)) =
            (self.interpreters.for_kind(&module.kind), module.kind.entry_point())
        else {
            return Err(ModuleError::UnsupportedType {
                name: name.to_string(),
                kind: module.kind.to_string(),
            });
        };

        let script = module.path.join(entry);
        if !script.is_file() {
            return Err(ModuleError::NoEntryPoint {
                dir: module.path.clone(),
                expected: entry,
            });
        }

        debug!(module = name, args = args.len(), "executing module");
        run_script(interpreter, &script, &module.path, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn discover_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let modules_dir = dir.path().join("modules");
        let manager = ModuleManager::new(&modules_dir, Interpreters::default());
        assert_eq!(manager.discover().unwrap(), 0);
        assert!(modules_dir.is_dir());
    }

    #[test]
    fn kind_is_inferred_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("py-mod")).unwrap();
        write(&dir.path().join("py-mod/main.py"), "print('hi')\n");
        std::fs::create_dir(dir.path().join("sh-mod")).unwrap();
        write(&dir.path().join("sh-mod/main.sh"), "echo hi\n");

        let manager = ModuleManager::new(dir.path(), Interpreters::default());
        assert_eq!(manager.discover().unwrap(), 2);
        assert_eq!(manager.module("py-mod").unwrap().kind, ModuleKind::Python);
        assert_eq!(manager.module("sh-mod").unwrap().kind, ModuleKind::Bash);
    }

    #[test]
    fn broken_metadata_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("broken")).unwrap();
        write(&dir.path().join("broken/module.yaml"), "options: [oops");

        let manager = ModuleManager::new(dir.path(), Interpreters::default());
        manager.discover().unwrap();
        let module = manager.module("broken").unwrap();
        assert!(!module.is_loaded());
        assert!(matches!(
            manager.loaded("broken"),
            Err(ModuleError::LoadFailed { .. })
        ));
    }

    #[test]
    fn missing_required_lists_absent_options() {
        let module = ModuleInfo {
            name: "scan".to_string(),
            path: PathBuf::from("/tmp/scan"),
            kind: ModuleKind::Bash,
            metadata: Some(ModuleMetadata {
                required: vec!["target".to_string(), "port".to_string()],
                ..ModuleMetadata::default()
            }),
            load_error: None,
        };
        let mut args = ModuleArgs::new();
        args.insert("target".to_string(), "10.0.0.1".to_string());
        assert_eq!(module.missing_required(&args), vec!["port".to_string()]);
    }
}
