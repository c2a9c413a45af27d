use std::{
    fs::{DirEntry, FileType},
    io,
    path::{Component, Path, PathBuf},
};

use crate::error::{Error, Result};

/// A discovered markdown file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the source root directory.
    pub relative_path: PathBuf,
    /// Full path as found under the source root.
    pub full_path: PathBuf,
}

impl DiscoveredFile {
    /// The relative path joined with `/`, used as the document identifier.
    pub fn identifier(&self) -> String {
        self.relative_path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Extension recognized as a markdown document.
pub const DOCUMENT_EXTENSION: &str = ".md";

/// Recursively walk a directory and discover every markdown file.
///
/// Results are sorted by relative path so every run enumerates documents
/// in the same order. A missing or unreadable root is an error;
/// unreadable subdirectories and entries are skipped with a warning.
pub fn discover_files(root: &Path) -> Result<Vec<DiscoveredFile>> {
    let entries =
        std::fs::read_dir(root).map_err(|source| Error::SourceDir {
            path: root.to_path_buf(),
            source,
        })?;

    let mut results = Vec::new();
    walk_entries(root, entries, &mut results);
    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(results)
}

fn walk_dir(root: &Path, current: &Path, results: &mut Vec<DiscoveredFile>) {
    match std::fs::read_dir(current) {
        Ok(entries) => walk_entries(root, entries, results),
        Err(e) => tracing::warn!(
            path = %current.display(),
            error = %e,
            "skipping unreadable directory"
        ),
    }
}

fn walk_entries(
    root: &Path,
    entries: std::fs::ReadDir,
    results: &mut Vec<DiscoveredFile>,
) {
    for entry in entries {
        let Some((path, file_type)) = inspect_entry(entry) else {
            continue;
        };

        if file_type.is_dir() {
            walk_dir(root, &path, results);
        } else if file_type.is_symlink() {
            // Linked files are read through the link; linked directories
            // are not descended into.
            let resolved = match path.canonicalize() {
                Ok(p) => p,
                Err(_) => continue, // Skip broken symlinks
            };
            if resolved.is_file() && is_document(&path) {
                results.push(make_discovered(root, &path));
            }
        } else if file_type.is_file() && is_document(&path) {
            results.push(make_discovered(root, &path));
        }
    }
}

/// Path and type of a directory entry, or `None` (with a warning) when
/// either cannot be read.
fn inspect_entry(entry: io::Result<DirEntry>) -> Option<(PathBuf, FileType)> {
    let entry = entry
        .inspect_err(|e| {
            tracing::warn!(error = %e, "skipping unreadable directory entry");
        })
        .ok()?;
    let path = entry.path();
    match entry.file_type() {
        Ok(file_type) => Some((path, file_type)),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "skipping entry with unknown file type"
            );
            None
        }
    }
}

fn is_document(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(DOCUMENT_EXTENSION))
}

fn make_discovered(root: &Path, path: &Path) -> DiscoveredFile {
    let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();

    DiscoveredFile {
        relative_path,
        full_path: path.to_path_buf(),
    }
}
