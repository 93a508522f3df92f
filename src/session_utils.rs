use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Session and project identity derived from a log file's location.
///
/// Claude Code stores each conversation as `<claude_dir>/projects/<encoded-dir>/<session>.jsonl`,
/// where `<encoded-dir>` is the project's working directory with `/` replaced by `-`.
pub struct SessionUtils;

impl SessionUtils {
    /// Session identifier: the file's base name without the `.jsonl` extension.
    pub fn session_id(file_path: &Path) -> String {
        file_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// The encoded project segment: the one following the last `projects` directory.
    pub fn encoded_project_segment(file_path: &Path) -> Option<String> {
        let segments: Vec<String> = file_path
            .parent()?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        let position = segments
            .iter()
            .rposition(|segment| segment == "projects")?;
        segments.get(position + 1).cloned()
    }

    /// Decode a project name from a file path.
    ///
    /// `-home-<user>-...` segments are rebuilt into a filesystem path, probing the disk
    /// to recover directory names that themselves contain dashes, then shown relative
    /// to `home`. Anything else has its dashes turned into slashes.
    pub fn decode_project_name(file_path: &Path, home: Option<&Path>) -> String {
        let Some(encoded) = Self::encoded_project_segment(file_path) else {
            return "unknown".to_string();
        };

        if let Some(rest) = encoded.strip_prefix('-') {
            let parts: Vec<&str> = rest.split('-').collect();

            if parts.len() > 2 && parts[0] == "home" {
                let mut candidate = format!("/{}", parts.join("/"));

                if !Path::new(&candidate).exists() && parts.len() > 3 {
                    for split_point in (3..parts.len()).rev() {
                        candidate = format!(
                            "/{}/{}",
                            parts[..split_point].join("/"),
                            parts[split_point..].join("-")
                        );
                        if Path::new(&candidate).exists() {
                            break;
                        }
                    }
                }

                if let Some(home) = home {
                    let prefix = format!("{}/", home.to_string_lossy().trim_end_matches('/'));
                    if let Some(relative) = candidate.strip_prefix(&prefix) {
                        return relative.to_string();
                    }
                }
                return candidate;
            }
        }

        encoded.replace('-', "/")
    }
}

/// Memoizes project-name decoding per file path.
///
/// Decoding may touch the filesystem, so each path is decoded once per run. The cache
/// is an explicit value owned by the aggregator rather than process-wide state.
#[derive(Debug, Clone, Default)]
pub struct ProjectNameCache {
    home: Option<PathBuf>,
    names: HashMap<PathBuf, String>,
}

impl ProjectNameCache {
    pub fn new() -> Self {
        Self::with_home(dirs::home_dir())
    }

    pub fn with_home(home: Option<PathBuf>) -> Self {
        Self {
            home,
            names: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, file_path: &Path) -> String {
        if let Some(name) = self.names.get(file_path) {
            return name.clone();
        }

        let name = SessionUtils::decode_project_name(file_path, self.home.as_deref());
        self.names.insert(file_path.to_path_buf(), name.clone());
        name
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}
