use crate::{ConfigError, ModshConfig};
use regex::Regex;
use std::path::PathBuf;
use tracing::debug;

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/modsh/modsh.yaml"));
        }
        search_paths.push(PathBuf::from("./modsh.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/modsh/modsh.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    pub fn with_file(mut self, path: &str) -> Self {
        self.explicit_file = Some(PathBuf::from(path));
        self
    }

    /// Replace the default search paths. Files are merged in the given order.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn load(&self) -> Result<ModshConfig, ConfigError> {
        let mut config = ModshConfig::default();

        if let Ok(env_path) = std::env::var("MODSH_CONFIG") {
            config = self.read_file(&PathBuf::from(env_path))?;
        } else if let Some(ref explicit) = self.explicit_file {
            config = self.read_file(explicit)?;
        } else {
            for path in &self.search_paths {
                if path.exists() {
                    if let Ok(content) = std::fs::read_to_string(path) {
                        debug!(path = %path.display(), "merging config file");
                        config = self.merge_yaml(&config, &content)?;
                    }
                }
            }
        }

        self.apply_env_overrides(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    fn read_file(&self, path: &PathBuf) -> Result<ModshConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), "loading config file");
        self.parse_yaml(&content)
    }

    fn parse_yaml(&self, content: &str) -> Result<ModshConfig, ConfigError> {
        let expanded = self.expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn merge_yaml(&self, base: &ModshConfig, content: &str) -> Result<ModshConfig, ConfigError> {
        let overlay = self.parse_yaml(content)?;
        Ok(Self::merge_configs(base, &overlay))
    }

    fn merge_configs(base: &ModshConfig, overlay: &ModshConfig) -> ModshConfig {
        let mut result = base.clone();
        let defaults = ModshConfig::default();

        if overlay.shell != defaults.shell {
            result.shell = overlay.shell.clone();
        }
        if overlay.modules != defaults.modules {
            result.modules = overlay.modules.clone();
        }
        if overlay.session != defaults.session {
            result.session = overlay.session.clone();
        }
        if overlay.logging != defaults.logging {
            result.logging = overlay.logging.clone();
        }

        result
    }

    fn expand_env_vars(&self, content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .to_string()
    }

    fn apply_env_overrides(&self, config: &mut ModshConfig) {
        if let Ok(dir) = std::env::var("MODSH_MODULES_DIR") {
            if !dir.is_empty() {
                config.modules.dir = dir;
            }
        }
        if let Ok(level) = std::env::var("MODSH_LOG_LEVEL") {
            if let Ok(l) = serde_yaml::from_str(&level) {
                config.logging.level = l;
            }
        }
        if let Ok(prompt) = std::env::var("MODSH_PROMPT") {
            config.shell.prompt = prompt;
        }
        if let Ok(file) = std::env::var("MODSH_HISTORY_FILE") {
            if !file.is_empty() {
                config.shell.history.file = file;
            }
        }
    }

    fn validate(config: &ModshConfig) -> Result<(), ConfigError> {
        if config.modules.dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "modules.dir must not be empty".to_string(),
            ));
        }
        if config.session.persist && config.session.file.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "session.file is required when session.persist is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand a leading `~` and `$VAR` references in a configured path.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogLevel;
    use std::io::Write;

    #[test]
    fn expand_env_vars_works() {
        std::env::set_var("MODSH_TEST_VAR_123", "hello");
        let loader = ConfigLoader::new();
        let result = loader.expand_env_vars("value: ${MODSH_TEST_VAR_123}");
        assert_eq!(result, "value: hello");
        std::env::remove_var("MODSH_TEST_VAR_123");
    }

    #[test]
    fn missing_env_var_becomes_empty() {
        let loader = ConfigLoader::new();
        let result = loader.expand_env_vars("value: ${NONEXISTENT_VAR_XYZ}");
        assert_eq!(result, "value: ");
    }

    #[test]
    fn env_overrides_config() {
        std::env::set_var("MODSH_HISTORY_FILE", "/tmp/other_history");
        let mut config = ModshConfig::default();
        let loader = ConfigLoader::new();
        loader.apply_env_overrides(&mut config);
        assert_eq!(config.shell.history.file, "/tmp/other_history");
        std::env::remove_var("MODSH_HISTORY_FILE");
    }

    #[test]
    fn later_search_paths_override_earlier_sections() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.yaml");
        let local = dir.path().join("local.yaml");

        let mut f = std::fs::File::create(&system).unwrap();
        writeln!(f, "modules:\n  dir: /system/modules\nlogging:\n  level: info").unwrap();
        let mut f = std::fs::File::create(&local).unwrap();
        writeln!(f, "modules:\n  dir: /local/modules").unwrap();

        let loader = ConfigLoader::new().with_search_paths(vec![
            system,
            dir.path().join("missing.yaml"),
            local,
        ]);
        let config = loader.load().unwrap();
        assert_eq!(config.modules.dir, "/local/modules");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn explicit_file_must_exist() {
        let loader = ConfigLoader::new().with_file("/nonexistent/modsh.yaml");
        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn persist_without_file_is_rejected() {
        let mut config = ModshConfig::default();
        config.session.persist = true;
        config.session.file = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn expand_path_handles_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/modules"), home.join("modules"));
        }
        assert_eq!(expand_path("/abs/path"), PathBuf::from("/abs/path"));
    }
}
