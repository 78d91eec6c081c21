//! Input enumeration: turns user-supplied paths into an ordered batch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::{ExtractError, ExtractResult};

/// Discovers candidate files for a batch.
///
/// Every regular file is returned, including ones with unsupported
/// extensions: the orchestrator filters them so they show up in the batch
/// report as skipped instead of disappearing.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Display name: the path relative to the input it was found under
    pub name: String,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover the files at a path.
    ///
    /// A file path yields itself, named by its file name. A directory yields
    /// its files sorted by path and named relative to the directory,
    /// descending into subdirectories only when `recursive` is set. A missing
    /// path or an unreadable directory fails the whole batch.
    pub fn discover(&self, path: &Path) -> ExtractResult<Vec<DiscoveredFile>> {
        let meta = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExtractError::InputNotFound(path.to_path_buf())
            } else {
                ExtractError::Enumerate {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })?;

        if meta.is_file() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            return Ok(vec![DiscoveredFile {
                path: path.to_path_buf(),
                name,
                size: meta.len(),
            }]);
        }

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(path).follow_links(true).max_depth(max_depth) {
            let entry = match entry {
                Ok(entry) => entry,
                // The root itself cannot be listed: nothing to process
                Err(e) if e.depth() == 0 => {
                    return Err(ExtractError::Enumerate {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {:?}: {}", path, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match entry.metadata() {
                Ok(meta) => {
                    let name = relative_name(path, entry.path());
                    files.push(DiscoveredFile {
                        path: entry.into_path(),
                        name,
                        size: meta.len(),
                    });
                }
                Err(e) => tracing::warn!("Skipping {:?}: {}", entry.path(), e),
            }
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!("Discovered {} files under {:?}", files.len(), path);
        Ok(files)
    }

    /// Discover several paths, concatenating their batches in argument order.
    ///
    /// With more than one input, files found under a directory are prefixed
    /// with that directory's name. Names that still collide fall back to the
    /// full path.
    pub fn discover_all(&self, paths: &[PathBuf]) -> ExtractResult<Vec<DiscoveredFile>> {
        let mut files = Vec::new();
        for path in paths {
            let mut found = self.discover(path)?;
            if paths.len() > 1 && path.is_dir() {
                if let Some(root) = path.file_name() {
                    let root = root.to_string_lossy();
                    for file in &mut found {
                        file.name = format!("{root}/{}", file.name);
                    }
                }
            }
            files.extend(found);
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        for file in &files {
            *seen.entry(file.name.clone()).or_default() += 1;
        }
        for file in &mut files {
            if seen.get(&file.name).is_some_and(|&n| n > 1) {
                file.name = file.path.display().to_string();
            }
        }
        Ok(files)
    }
}

/// `/`-joined path of `file` relative to `root`.
fn relative_name(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
