//! Source discovery
//!
//! Recursively scans the source root. `.js` files are candidates for
//! compilation; everything else is copied through untouched.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::PipelineError;

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE FILES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    /// Path relative to the source root, `/`-separated.
    pub path: String,
    pub source: String,
}

#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    pub scripts: Vec<SourceFile>,
    /// Non-script files, relative to the source root.
    pub assets: Vec<String>,
}

/// Every file under `root`, sorted by relative path so runs are reproducible.
pub fn discover(root: &Path) -> Result<SourceTree, PipelineError> {
    if !root.is_dir() {
        return Err(PipelineError::Config(format!(
            "source directory not found: {}",
            root.display()
        )));
    }

    let mut tree = SourceTree::default();
    for path in find_files(root) {
        let relative = relative_unit_path(root, &path);
        if path.extension().map(|ext| ext == "js").unwrap_or(false) {
            let source = fs::read_to_string(&path).map_err(|e| PipelineError::io(&path, e))?;
            tree.scripts.push(SourceFile {
                path: relative,
                source,
            });
        } else {
            tree.assets.push(relative);
        }
    }
    log::info!(
        "discovered {} script(s) and {} other file(s) under {}",
        tree.scripts.len(),
        tree.assets.len(),
        root.display()
    );
    Ok(tree)
}

/// Recursively find all files in a directory
fn find_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.path().to_path_buf()),
            Ok(_) => {}
            Err(e) => log::warn!("skipping unreadable entry: {}", e),
        }
    }

    files
}

fn relative_unit_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read a single unit (the framework file) under its file name.
pub fn read_unit(path: &Path) -> Result<SourceFile, PipelineError> {
    let source = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile { path: name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_and_assets_are_split() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("app/view")).unwrap();
        fs::write(dir.path().join("app/view/Main.js"), "Ext.define('A', {});").unwrap();
        fs::write(dir.path().join("app/Application.js"), "var x = 1;").unwrap();
        fs::write(dir.path().join("app/style.css"), ".a {}").unwrap();

        let tree = discover(dir.path()).unwrap();
        let scripts: Vec<&str> = tree.scripts.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(scripts, vec!["app/Application.js", "app/view/Main.js"]);
        assert_eq!(tree.assets, vec!["app/style.css"]);
    }

    #[test]
    fn test_missing_root_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(discover(&missing), Err(PipelineError::Config(_))));
    }
}
