//! In-memory destination tree for composed theme files.
//!
//! Paths are forward-slash separated and relative to the composed root. A
//! write replaces whatever file was at the path before; a path never changes
//! between directory and file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ComposeError;

/// Entry stored in the virtual tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir,
    File(Vec<u8>),
}

impl Node {
    fn kind_name(&self) -> &'static str {
        match self {
            Node::Dir => "directory",
            Node::File(_) => "file",
        }
    }
}

/// Virtual file tree owned by a single build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualTree {
    nodes: BTreeMap<String, Node>,
}

impl VirtualTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` and any missing ancestors. Existing directories are fine.
    pub fn ensure_dir(&mut self, path: &str) -> Result<(), ComposeError> {
        let path = normalize(path)?;
        if path.is_empty() {
            return Ok(());
        }

        let chain = prefixes(&path);
        self.check_dirs(&chain)?;
        for dir in chain {
            self.nodes.entry(dir).or_insert(Node::Dir);
        }
        Ok(())
    }

    /// Create or fully replace the file at `path`, creating ancestors.
    /// Returns true when an existing file was replaced.
    pub fn write_file(&mut self, path: &str, content: Vec<u8>) -> Result<bool, ComposeError> {
        let path = normalize(path)?;
        if path.is_empty() {
            return Err(ComposeError::PathKindConflict {
                path,
                existing: "directory",
                theme: None,
            });
        }

        let mut chain = prefixes(&path);
        chain.pop();
        self.check_dirs(&chain)?;

        if let Some(Node::Dir) = self.nodes.get(&path) {
            return Err(ComposeError::PathKindConflict {
                path,
                existing: "directory",
                theme: None,
            });
        }

        for dir in chain {
            self.nodes.entry(dir).or_insert(Node::Dir);
        }
        let previous = self.nodes.insert(path, Node::File(content));
        Ok(previous.is_some())
    }

    /// Every path in `dirs` must be absent or a directory
    fn check_dirs(&self, dirs: &[String]) -> Result<(), ComposeError> {
        for dir in dirs {
            if let Some(node @ Node::File(_)) = self.nodes.get(dir) {
                return Err(ComposeError::PathKindConflict {
                    path: dir.clone(),
                    existing: node.kind_name(),
                    theme: None,
                });
            }
        }
        Ok(())
    }

    /// Look up an entry
    pub fn get(&self, path: &str) -> Option<&Node> {
        let path = normalize(path).ok()?;
        self.nodes.get(&path)
    }

    /// Content of the file at `path`
    pub fn file(&self, path: &str) -> Option<&[u8]> {
        match self.get(path)? {
            Node::File(content) => Some(content.as_slice()),
            Node::Dir => None,
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Node::Dir))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Number of entries, directories included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    /// Sum of all file sizes
    pub fn total_bytes(&self) -> u64 {
        self.files().map(|(_, c)| c.len() as u64).sum()
    }

    /// All entries in path order (parents before children)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(p, n)| (p.as_str(), n))
    }

    /// Files in path order
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.nodes.iter().filter_map(|(p, n)| match n {
            Node::File(content) => Some((p.as_str(), content.as_slice())),
            Node::Dir => None,
        })
    }

    /// All paths in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
}

/// Strip empty and `.` segments; `..` is rejected
fn normalize(path: &str) -> Result<String, ComposeError> {
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                return Err(ComposeError::InvalidPath {
                    path: PathBuf::from(path),
                })
            }
            other => parts.push(other),
        }
    }
    Ok(parts.join("/"))
}

/// "a/b/c" -> ["a", "a/b", "a/b/c"]
fn prefixes(path: &str) -> Vec<String> {
    path.match_indices('/')
        .map(|(i, _)| path[..i].to_string())
        .chain(std::iter::once(path.to_string()))
        .collect()
}
