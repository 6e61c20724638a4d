use crate::error::ModuleResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Contents of a module's `module.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleMetadata {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub author: String,
    pub version: String,
    pub options: BTreeMap<String, OptionMeta>,
    pub required: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionMeta {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub default: String,
    pub required: bool,
}

impl ModuleMetadata {
    pub fn load(path: &Path) -> ModuleResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ModuleResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Names of required options: the `required` list plus any option flagged
    /// `required: true`, without duplicates.
    pub fn required_options(&self) -> Vec<String> {
        let mut names = self.required.clone();
        for (name, option) in &self.options {
            if option.required && !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    Python,
    Bash,
    Other(String),
}

impl ModuleKind {
    pub fn from_type(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Self::Python,
            "bash" | "sh" | "shell" => Self::Bash,
            other => Self::Other(other.to_string()),
        }
    }

    /// File name of the entry script for this kind.
    pub fn entry_point(&self) -> Option<&'static str> {
        match self {
            Self::Python => Some("main.py"),
            Self::Bash => Some("main.sh"),
            Self::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Python => "python",
            Self::Bash => "bash",
            Self::Other(kind) => kind,
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
