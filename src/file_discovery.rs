use crate::error::CostsError;
use anyhow::Result;
use glob::glob;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Handles file system traversal and discovery of Claude Code session logs
#[derive(Debug, Default)]
pub struct FileDiscovery;

impl FileDiscovery {
    pub fn new() -> Self {
        Self
    }

    /// Find all JSONL files under `<claude_dir>/projects`.
    ///
    /// Sessions live directly in a project directory; some clients nest them one level
    /// deeper. The result is deduplicated and sorted so every run processes files in
    /// the same order.
    pub fn find_jsonl_files(&self, claude_dir: &Path) -> Result<Vec<PathBuf>> {
        let projects_dir = claude_dir.join("projects");
        if !projects_dir.is_dir() {
            return Err(CostsError::NoJsonlFiles(projects_dir).into());
        }

        let patterns = [
            projects_dir.join("*").join("*.jsonl"),
            projects_dir.join("*").join("*").join("*.jsonl"),
        ];

        let mut files = BTreeSet::new();
        for pattern in &patterns {
            let pattern = pattern.to_string_lossy();
            let paths = glob(&pattern)
                .map_err(|e| anyhow::anyhow!("Invalid glob pattern {}: {}", pattern, e))?;

            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() => {
                        files.insert(path);
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "Cannot read path during discovery"),
                }
            }
        }

        if files.is_empty() {
            return Err(CostsError::NoJsonlFiles(projects_dir).into());
        }

        debug!(count = files.len(), dir = %projects_dir.display(), "Discovered session files");
        Ok(files.into_iter().collect())
    }
}
