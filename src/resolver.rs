//! Theme chain resolution.
//!
//! A theme's parent is resolved and copied into the tree before the theme's
//! own files, so the closest descendant wins wherever layers share a path.
//! Each build owns its own [`VirtualTree`]; nothing is kept between builds.

use log::{debug, info};
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::ComposeError;
use crate::theme::{nested_theme_path, ConfigSource, ThemeLayer, ThemeName, ThemeOptions};
use crate::vfs::VirtualTree;
use crate::walker::{walk_layer, EntryKind};

/// Per-build tallies, for reporting only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeStats {
    pub files_copied: u64,
    pub bytes_copied: u64,
    pub directories: u64,
    /// Files that replaced one from an ancestor layer
    pub overrides: u64,
}

/// Result of a successful build
#[derive(Debug)]
pub struct Composition {
    /// Composed theme files
    pub tree: VirtualTree,
    /// Layers in copy order, root-most ancestor first
    pub chain: Vec<ThemeName>,
    pub stats: ComposeStats,
    pub duration: Duration,
}

/// Compose the theme enabled in the project's own configuration.
///
/// `theme_override` replaces the configured theme name; its options are
/// still looked up in the project's `theme_config`.
pub fn compose_site(
    project_root: &Path,
    configs: &dyn ConfigSource,
    theme_override: Option<&ThemeName>,
) -> Result<Composition, ComposeError> {
    let config_path = configs.describe(project_root);
    let config = configs.load(project_root)?;

    let theme = match theme_override {
        Some(theme) => theme.clone(),
        None => config
            .enabled_theme(&config_path)?
            .ok_or(ComposeError::NoThemeEnabled { path: config_path })?,
    };

    let options = config.options_for(&theme);
    let theme_root = nested_theme_path(project_root, &theme);
    compose(&theme, &theme_root, &options, configs)
}

/// Resolve `theme` and its ancestors into a fresh tree
pub fn compose(
    theme: &ThemeName,
    theme_root: &Path,
    options: &ThemeOptions,
    configs: &dyn ConfigSource,
) -> Result<Composition, ComposeError> {
    let start = Instant::now();
    let mut tree = VirtualTree::new();
    let mut stats = ComposeStats::default();

    let chain = resolve_into(&mut tree, theme, theme_root, options, configs, &mut stats)?;

    let duration = start.elapsed();
    info!("Building themes took {:.2?}", duration);

    Ok(Composition {
        tree,
        chain,
        stats,
        duration,
    })
}

/// Resolve `theme` and its ancestors into `tree`, returning the layers in
/// copy order. Fails on the first error at any layer.
pub fn resolve_into(
    tree: &mut VirtualTree,
    theme: &ThemeName,
    theme_root: &Path,
    options: &ThemeOptions,
    configs: &dyn ConfigSource,
    stats: &mut ComposeStats,
) -> Result<Vec<ThemeName>, ComposeError> {
    let mut build = Build {
        tree,
        configs,
        stats,
        visiting: Vec::new(),
        resolved: Vec::new(),
    };
    build.resolve_layer(theme, theme_root, options)?;
    Ok(build.resolved)
}

/// State of one build while the chain is walked
struct Build<'a> {
    tree: &'a mut VirtualTree,
    configs: &'a dyn ConfigSource,
    stats: &'a mut ComposeStats,
    /// Layers whose ancestors are still being resolved
    visiting: Vec<ThemeName>,
    resolved: Vec<ThemeName>,
}

impl Build<'_> {
    fn resolve_layer(
        &mut self,
        theme: &ThemeName,
        theme_root: &Path,
        options: &ThemeOptions,
    ) -> Result<(), ComposeError> {
        if self.visiting.contains(theme) {
            let mut cycle: Vec<&str> = self.visiting.iter().map(ThemeName::as_str).collect();
            cycle.push(theme.as_str());
            return Err(ComposeError::CycleDetected {
                cycle: cycle.join(" -> "),
            });
        }

        info!("Found theme named: {}", theme);
        let layer = ThemeLayer::load(theme.clone(), theme_root.to_path_buf(), options, self.configs)?;
        self.visiting.push(theme.clone());

        if let (Some(parent), Some(parent_root)) = (&layer.parent, layer.parent_root()) {
            self.resolve_layer(parent, &parent_root, &layer.parent_options)?;
        }

        copy_layer(self.tree, &layer, self.stats)?;
        self.visiting.pop();
        self.resolved.push(layer.name);
        Ok(())
    }
}

/// Copy one layer's files on top of the tree.
///
/// File contents are read in parallel; writes happen in walk order.
fn copy_layer(
    tree: &mut VirtualTree,
    layer: &ThemeLayer,
    stats: &mut ComposeStats,
) -> Result<(), ComposeError> {
    let theme = layer.name.as_str();
    let entries = walk_layer(&layer.root, theme, &layer.exclusions).collect::<Result<Vec<_>, _>>()?;

    let contents = entries
        .par_iter()
        .map(|entry| match entry.kind {
            EntryKind::File => entry.read(theme).map(Some),
            EntryKind::Dir => Ok(None),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut copied = 0u64;
    for (entry, content) in entries.iter().zip(contents) {
        match content {
            None => {
                tree.ensure_dir(&entry.relative)
                    .map_err(|e| e.with_theme(theme))?;
                stats.directories += 1;
            }
            Some(content) => {
                let bytes = content.len() as u64;
                let replaced = tree
                    .write_file(&entry.relative, content)
                    .map_err(|e| e.with_theme(theme))?;
                if replaced {
                    debug!("[{}] overrides {}", theme, entry.relative);
                    stats.overrides += 1;
                }
                copied += 1;
                stats.files_copied += 1;
                stats.bytes_copied += bytes;
            }
        }
    }

    info!("Number of theme files copied: {}", copied);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{JsonConfig, SITE_CONFIG_FILE};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn name(s: &str) -> ThemeName {
        ThemeName::parse(s).unwrap()
    }

    fn compose_json(theme: &str, root: &Path) -> Result<Composition, ComposeError> {
        compose(&name(theme), root, &ThemeOptions::default(), &JsonConfig::default())
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// child -> base
    fn make_chain(temp: &TempDir) -> PathBuf {
        let child = temp.path().join("child");
        write(&child, SITE_CONFIG_FILE, r#"{"theme": "base"}"#);
        write(&child, "layout.html", "child layout");

        let base = child.join("themes").join("base");
        write(&base, SITE_CONFIG_FILE, "{}");
        write(&base, "layout.html", "base layout");
        write(&base, "logo.png", "base logo");
        child
    }

    // ==================== Ordering and overrides ====================

    #[test]
    fn test_descendant_overrides_ancestor() {
        let temp = TempDir::new().unwrap();
        let child = make_chain(&temp);

        let result = compose_json("child", &child).unwrap();

        assert_eq!(result.tree.file("layout.html"), Some(&b"child layout"[..]));
        assert_eq!(result.tree.file("logo.png"), Some(&b"base logo"[..]));
        assert_eq!(result.chain, vec![name("base"), name("child")]);
        assert_eq!(result.stats.overrides, 2); // layout.html and site.json
    }

    #[test]
    fn test_nested_themes_dir_not_copied() {
        let temp = TempDir::new().unwrap();
        let child = make_chain(&temp);

        let result = compose_json("child", &child).unwrap();

        assert!(!result.tree.contains("themes"));
        assert!(!result.tree.paths().any(|p| p.starts_with("themes/")));
    }

    #[test]
    fn test_stats() {
        let temp = TempDir::new().unwrap();
        let child = make_chain(&temp);

        let result = compose_json("child", &child).unwrap();

        // base: site.json, layout.html, logo.png; child: site.json, layout.html
        assert_eq!(result.stats.files_copied, 5);
        assert_eq!(result.stats.directories, 0);
        assert_eq!(result.tree.file_count(), 3);
    }

    // ==================== Exclusions ====================

    #[test]
    fn test_parent_options_from_child_config() {
        let temp = TempDir::new().unwrap();
        let child = temp.path().join("child");
        write(
            &child,
            SITE_CONFIG_FILE,
            r#"{"theme": "base", "theme_config": {"base": {"exclude": ["assets"]}}}"#,
        );
        write(&child, "assets/child.css", "child css");

        let base = child.join("themes/base");
        write(&base, SITE_CONFIG_FILE, "{}");
        write(&base, "assets/base.css", "base css");
        write(&base, "layout.html", "base");

        let result = compose_json("child", &child).unwrap();

        assert!(!result.tree.contains("assets/base.css"));
        assert_eq!(result.tree.file("assets/child.css"), Some(&b"child css"[..]));
        assert!(result.tree.contains("layout.html"));
    }

    #[test]
    fn test_top_level_options_apply_only_to_top_layer() {
        let temp = TempDir::new().unwrap();
        let child = make_chain(&temp);
        let options = ThemeOptions {
            exclude: vec!["logo.png".to_string(), "layout.html".to_string()],
            ..Default::default()
        };

        let result = compose(&name("child"), &child, &options, &JsonConfig::default()).unwrap();

        // child's layout.html skipped, base's files still present
        assert_eq!(result.tree.file("layout.html"), Some(&b"base layout"[..]));
        assert_eq!(result.tree.file("logo.png"), Some(&b"base logo"[..]));
    }

    // ==================== Errors ====================

    #[test]
    fn test_direct_cycle_detected() {
        let temp = TempDir::new().unwrap();
        let loop_root = temp.path().join("loop");
        write(&loop_root, SITE_CONFIG_FILE, r#"{"theme": "loop"}"#);
        let nested = loop_root.join("themes/loop");
        write(&nested, SITE_CONFIG_FILE, r#"{"theme": "loop"}"#);

        let result = compose_json("loop", &loop_root);

        match result {
            Err(ComposeError::CycleDetected { cycle }) => assert_eq!(cycle, "loop -> loop"),
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_transitive_cycle_detected() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        write(&a, SITE_CONFIG_FILE, r#"{"theme": "b"}"#);
        let b = a.join("themes/b");
        write(&b, SITE_CONFIG_FILE, r#"{"theme": "a"}"#);
        let a2 = b.join("themes/a");
        write(&a2, SITE_CONFIG_FILE, r#"{"theme": "b"}"#);

        let result = compose_json("a", &a);

        match result {
            Err(ComposeError::CycleDetected { cycle }) => assert_eq!(cycle, "a -> b -> a"),
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_parent_aborts() {
        let temp = TempDir::new().unwrap();
        let child = temp.path().join("child");
        write(&child, SITE_CONFIG_FILE, r#"{"theme": "ghost"}"#);

        let result = compose_json("child", &child);
        assert!(matches!(result, Err(ComposeError::ThemeNotFound { ref theme, .. }) if theme == "ghost"));
    }

    #[test]
    fn test_broken_ancestor_config_aborts() {
        let temp = TempDir::new().unwrap();
        let child = make_chain(&temp);
        write(&child, "themes/base/site.json", "{ broken");

        let result = compose_json("child", &child);
        assert!(matches!(result, Err(ComposeError::ConfigParse { .. })));
    }

    #[test]
    fn test_path_kind_conflict_across_layers() {
        let temp = TempDir::new().unwrap();
        let child = make_chain(&temp);
        // base has logo.png as a file, child claims it as a directory
        write(&child, "logo.png/inner.txt", "nope");

        let result = compose_json("child", &child);
        match result {
            Err(ComposeError::PathKindConflict { path, theme, .. }) => {
                assert_eq!(path, "logo.png");
                assert_eq!(theme.as_deref(), Some("child"));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    // ==================== Project entry point ====================

    #[test]
    fn test_compose_site_uses_enabled_theme() {
        let temp = TempDir::new().unwrap();
        let project = temp.path();
        write(
            project,
            SITE_CONFIG_FILE,
            r#"{"theme": "child", "theme_config": {"child": {"exclude": ["logo.png"]}}}"#,
        );
        let child = project.join("themes/child");
        write(&child, SITE_CONFIG_FILE, "{}");
        write(&child, "layout.html", "child");
        write(&child, "logo.png", "child logo");

        let result = compose_site(project, &JsonConfig::default(), None).unwrap();

        assert_eq!(result.chain, vec![name("child")]);
        assert!(result.tree.contains("layout.html"));
        assert!(!result.tree.contains("logo.png"));
    }

    #[test]
    fn test_compose_site_override() {
        let temp = TempDir::new().unwrap();
        let project = temp.path();
        write(project, SITE_CONFIG_FILE, r#"{"theme": "missing"}"#);
        let other = project.join("themes/other");
        write(&other, SITE_CONFIG_FILE, "{}");
        write(&other, "index.html", "other");

        let result = compose_site(project, &JsonConfig::default(), Some(&name("other"))).unwrap();
        assert_eq!(result.tree.file("index.html"), Some(&b"other"[..]));
    }

    #[test]
    fn test_compose_site_no_theme() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), SITE_CONFIG_FILE, "{}");

        let result = compose_site(temp.path(), &JsonConfig::default(), None);
        assert!(matches!(result, Err(ComposeError::NoThemeEnabled { .. })));
    }

    #[test]
    fn test_resolve_into_existing_tree() {
        let temp = TempDir::new().unwrap();
        let child = make_chain(&temp);
        let mut tree = VirtualTree::new();
        let mut stats = ComposeStats::default();

        let chain = resolve_into(
            &mut tree,
            &name("child"),
            &child,
            &ThemeOptions::default(),
            &JsonConfig::default(),
            &mut stats,
        )
        .unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(stats.files_copied, 5);
        assert_eq!(tree.file("layout.html"), Some(&b"child layout"[..]));
    }
}
