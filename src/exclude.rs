//! Per-layer exclusion rules.
//!
//! Directories are matched by their full path relative to the theme root and
//! pruned with everything beneath them. Files are matched by base name only,
//! so an entry like `draft.json` skips that name at any depth.
//!
//! Note the asymmetry: `assets/img` prunes exactly one directory, while
//! `logo.png` drops every file called `logo.png` in the layer. Existing themes
//! may rely on either behavior.

/// Entries every layer skips: VCS metadata, ignore files, nested theme storage
pub const BUILTIN_EXCLUSIONS: &[&str] = &[".git", ".gitignore", NESTED_THEMES_DIR];

/// Directory inside a theme (or project) holding the themes it inherits from
pub const NESTED_THEMES_DIR: &str = "themes";

/// Effective skip rules for a single theme layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    entries: Vec<String>,
    builtin_len: usize,
}

impl ExclusionSet {
    /// Built-in exclusions plus the layer's own declared entries
    pub fn for_layer<S: AsRef<str>>(declared: &[S]) -> Self {
        let mut entries: Vec<String> = Vec::with_capacity(BUILTIN_EXCLUSIONS.len() + declared.len());
        entries.extend(BUILTIN_EXCLUSIONS.iter().map(|s| s.to_string()));
        entries.extend(declared.iter().map(|s| s.as_ref().to_string()));
        Self {
            entries,
            builtin_len: BUILTIN_EXCLUSIONS.len(),
        }
    }

    /// Only the built-in exclusions
    pub fn builtin() -> Self {
        Self::for_layer::<&str>(&[])
    }

    /// Entries declared by the layer itself, without the built-ins
    pub fn declared(&self) -> &[String] {
        &self.entries[self.builtin_len..]
    }

    /// All entries, built-ins first
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Decide whether an entry is skipped
    ///
    /// `relative_path` is forward-slash separated and relative to the theme
    /// root; `base_name` is its last component.
    #[inline]
    pub fn is_excluded(&self, relative_path: &str, base_name: &str, is_dir: bool) -> bool {
        is_excluded(relative_path, base_name, is_dir, self)
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Directory entries match on full relative path, files on base name.
pub fn is_excluded(
    relative_path: &str,
    base_name: &str,
    is_dir: bool,
    exclusions: &ExclusionSet,
) -> bool {
    exclusions.entries.iter().any(|excluded| {
        if is_dir {
            relative_path == excluded
        } else {
            base_name == excluded
        }
    })
}
