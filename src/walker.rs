use log::debug;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ComposeError;
use crate::exclude::ExclusionSet;

/// What a walked entry asks the virtual tree to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Ensure the directory exists
    Dir,
    /// Copy the file's content
    File,
}

/// A non-excluded entry of one theme layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    /// Forward-slash path relative to the theme root
    pub relative: String,
    pub kind: EntryKind,
    /// Absolute location on disk
    pub source: PathBuf,
}

impl LayerEntry {
    /// Open the source file for reading
    pub fn open(&self) -> std::io::Result<File> {
        File::open(&self.source)
    }

    /// Read the full content of a file entry
    pub fn read(&self, theme: &str) -> Result<Vec<u8>, ComposeError> {
        fs::read(&self.source).map_err(|source| ComposeError::ReadFailed {
            theme: theme.to_string(),
            path: self.source.clone(),
            source,
        })
    }
}

/// Lazy, depth-first walk over one theme layer in file-name order.
///
/// Excluded directories are pruned, excluded files skipped. The theme root
/// itself is not yielded.
pub struct LayerWalk<'a> {
    inner: walkdir::IntoIter,
    root: PathBuf,
    theme: String,
    exclusions: &'a ExclusionSet,
}

/// Start a fresh walk of `root`
pub fn walk_layer<'a>(root: &Path, theme: &str, exclusions: &'a ExclusionSet) -> LayerWalk<'a> {
    let inner = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    LayerWalk {
        inner,
        root: root.to_path_buf(),
        theme: theme.to_string(),
        exclusions,
    }
}

impl Iterator for LayerWalk<'_> {
    type Item = Result<LayerEntry, ComposeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    return Some(Err(ComposeError::Walk {
                        theme: self.theme.clone(),
                        source,
                    }))
                }
            };

            let relative = match relative_path(&self.root, entry.path()) {
                Ok(relative) => relative,
                Err(e) => return Some(Err(e)),
            };
            let base_name = relative.rsplit('/').next().unwrap_or(relative.as_str());
            let is_dir = entry.file_type().is_dir();

            if self.exclusions.is_excluded(&relative, base_name, is_dir) {
                if is_dir {
                    debug!("[{}] pruning excluded directory {}", self.theme, relative);
                    self.inner.skip_current_dir();
                } else {
                    debug!("[{}] skipping excluded file {}", self.theme, relative);
                }
                continue;
            }

            let kind = if is_dir { EntryKind::Dir } else { EntryKind::File };
            return Some(Ok(LayerEntry {
                relative,
                kind,
                source: entry.into_path(),
            }));
        }
    }
}

/// Forward-slash path of `path` relative to `root`
pub fn relative_path(root: &Path, path: &Path) -> Result<String, ComposeError> {
    let stripped = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();

    for component in stripped.components() {
        if let Component::Normal(name) = component {
            let name = name.to_str().ok_or_else(|| ComposeError::InvalidPath {
                path: path.to_path_buf(),
            })?;
            parts.push(name);
        }
    }

    Ok(parts.join("/"))
}
