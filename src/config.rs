//! Compiler configuration.
//!
//! Loaded from a camelCase JSON file; every field has a default so partial files
//! work. The CLI overrides individual fields after loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

pub const DEFAULT_DEFINE_CALLEE: &str = "Ext.define";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    /// Unit declaring the framework classes and aliases.
    pub framework_file: Option<PathBuf>,
    /// Extra words for event-name capitalization.
    pub words: Vec<String>,
    /// Callee spellings recognized as class definitions.
    pub define_callees: Vec<String>,
    pub snapshot_dir: PathBuf,
    /// When set, the parsed and resolved codebase is cached under this id.
    pub snapshot_id: Option<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            source_dir: PathBuf::from("src"),
            target_dir: PathBuf::from("out"),
            framework_file: None,
            words: Vec::new(),
            define_callees: vec![DEFAULT_DEFINE_CALLEE.to_string()],
            snapshot_dir: PathBuf::from(".extjs2react/snapshots"),
            snapshot_id: None,
        }
    }
}

impl CompilerConfig {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let data = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: CompilerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.define_callees.is_empty() {
            return Err(PipelineError::Config("defineCallees must not be empty".to_string()));
        }
        if self.source_dir == self.target_dir {
            return Err(PipelineError::Config(format!(
                "sourceDir and targetDir are both {}",
                self.source_dir.display()
            )));
        }
        Ok(())
    }
}
