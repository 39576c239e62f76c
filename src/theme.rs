//! Theme names, per-theme options and site configuration.
//!
//! Every project and every theme carries a `site.json`. Only two keys matter
//! for composition: `theme` names the theme being inherited from, and
//! `theme_config` holds options (exclusions, source url, pinned commit) per
//! inherited theme. Other keys are ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ComposeError;
use crate::exclude::{ExclusionSet, NESTED_THEMES_DIR};

/// Name of the configuration file at the root of a project or theme
pub const SITE_CONFIG_FILE: &str = "site.json";

/// Theme name, also the directory name under `themes/`.
/// Newtype wrapper for type safety and validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThemeName(Arc<str>);

impl ThemeName {
    /// Parse a theme name, rejecting anything that is not a single path segment
    pub fn parse(s: &str) -> Option<Self> {
        let valid = !s.is_empty()
            && s != "."
            && s != ".."
            && !s.contains('/')
            && !s.contains('\\');
        if valid {
            Some(Self(Arc::from(s)))
        } else {
            None
        }
    }

    /// Get the inner string reference
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options for one inherited theme, as declared by whoever inherits it
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThemeOptions {
    /// Repository the theme was cloned from
    pub url: Option<String>,
    /// Pinned revision
    pub commit: Option<String>,
    /// Paths (directories) and base names (files) to skip for this layer
    pub exclude: Vec<String>,
}

/// The parts of `site.json` relevant to theme composition
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Enabled theme; empty when the site (or theme) inherits from nothing
    pub theme: String,
    /// Options per theme name
    pub theme_config: BTreeMap<String, ThemeOptions>,
}

impl SiteConfig {
    /// Declared theme, if any. `path` is only used for error reporting
    pub fn enabled_theme(&self, path: &Path) -> Result<Option<ThemeName>, ComposeError> {
        let name = self.theme.trim();
        if name.is_empty() {
            return Ok(None);
        }
        ThemeName::parse(name)
            .map(Some)
            .ok_or_else(|| ComposeError::InvalidThemeName {
                name: name.to_string(),
                path: path.to_path_buf(),
            })
    }

    /// Options declared for `theme`, defaulting to none
    pub fn options_for(&self, theme: &ThemeName) -> ThemeOptions {
        self.theme_config
            .get(theme.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

/// Parse `site.json` content
pub fn parse_site_config(json: &str, path: &Path) -> Result<SiteConfig, ComposeError> {
    serde_json::from_str(json).map_err(|source| ComposeError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `<root>/<file_name>`
pub fn read_site_config_file(root: &Path, file_name: &str) -> Result<SiteConfig, ComposeError> {
    let path = root.join(file_name);
    let content = fs::read_to_string(&path).map_err(|source| ComposeError::ConfigRead {
        path: path.clone(),
        source,
    })?;
    parse_site_config(&content, &path)
}

/// Source of per-theme configuration, keyed by theme root
pub trait ConfigSource {
    /// Load the configuration of the theme (or project) at `root`
    fn load(&self, root: &Path) -> Result<SiteConfig, ComposeError>;

    /// Where the configuration of `root` lives, for error messages
    fn describe(&self, root: &Path) -> PathBuf;
}

/// Reads a JSON config file with a fixed name from each root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonConfig {
    file_name: String,
}

impl JsonConfig {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self::new(SITE_CONFIG_FILE)
    }
}

impl ConfigSource for JsonConfig {
    fn load(&self, root: &Path) -> Result<SiteConfig, ComposeError> {
        read_site_config_file(root, &self.file_name)
    }

    fn describe(&self, root: &Path) -> PathBuf {
        root.join(&self.file_name)
    }
}

/// Location of an inherited theme below `root`: `<root>/themes/<name>`
pub fn nested_theme_path(root: &Path, name: &ThemeName) -> PathBuf {
    root.join(NESTED_THEMES_DIR).join(name.as_str())
}

/// One theme in the chain, built when the resolver reaches it
#[derive(Debug, Clone)]
pub struct ThemeLayer {
    /// Theme name
    pub name: ThemeName,
    /// Directory holding the theme's files
    pub root: PathBuf,
    /// Skip rules for this layer only
    pub exclusions: ExclusionSet,
    /// Theme this layer inherits from (None for the root-most ancestor)
    pub parent: Option<ThemeName>,
    /// Options this layer declares for its parent
    pub parent_options: ThemeOptions,
}

impl ThemeLayer {
    /// Load a layer. `options` come from the layer that inherits it.
    pub fn load(
        name: ThemeName,
        root: PathBuf,
        options: &ThemeOptions,
        configs: &dyn ConfigSource,
    ) -> Result<Self, ComposeError> {
        if !root.is_dir() {
            return Err(ComposeError::ThemeNotFound {
                theme: name.to_string(),
                path: root,
            });
        }

        let config = configs.load(&root)?;
        let parent = config.enabled_theme(&configs.describe(&root))?;
        let parent_options = parent
            .as_ref()
            .map(|p| config.options_for(p))
            .unwrap_or_default();

        Ok(Self {
            name,
            exclusions: ExclusionSet::for_layer(&options.exclude),
            root,
            parent,
            parent_options,
        })
    }

    /// Directory of the parent theme, if one is declared
    pub fn parent_root(&self) -> Option<PathBuf> {
        self.parent
            .as_ref()
            .map(|p| nested_theme_path(&self.root, p))
    }
}
