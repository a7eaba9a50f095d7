use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::error;

/// A file or directory considered by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

impl Entry {
    /// Symlinks are entries of their own and never followed.
    pub fn from_path(path: &Path) -> io::Result<Entry> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Entry {
            path: path.to_path_buf(),
            name,
            is_dir: metadata.is_dir(),
        })
    }
}

pub fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

pub fn is_ignored(path: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches_path(path))
}

/// Lists a directory's entries sorted by name.
pub fn list_children(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        children.push(Entry::from_path(&entry.path())?);
    }
    children.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(children)
}
