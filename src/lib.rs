//! # Theme Compose
//!
//! Composes a site's inherited themes into one in-memory file tree.
//!
//! A site enables a theme; that theme may itself inherit from a theme stored
//! in its own `themes/` directory, and so on. Ancestors are copied first and
//! descendants on top, so the closest theme wins wherever two layers provide
//! the same relative path. The real project directory is never written to.
//!
//! ## Features
//!
//! - Recursive theme chain resolution with cycle detection
//! - Per-layer exclusions (directories by path, files by name)
//! - Last-write-wins virtual tree with path-kind conflict detection
//! - Parallel file reads within a layer using Rayon
//!
//! ## Usage
//!
//! ```ignore
//! use theme_compose::resolver::compose_site;
//! use theme_compose::theme::JsonConfig;
//!
//! let composition = compose_site(&project_root, &JsonConfig::default(), None)?;
//! let layout = composition.tree.file("layouts/global/html.svelte");
//! ```

/// CLI configuration and argument parsing
pub mod config;

/// Error types for composition operations
pub mod error;

/// Per-layer exclusion rules
pub mod exclude;

/// Writing a composed tree to disk
pub mod export;

/// Theme chain resolution
pub mod resolver;

/// Theme names, options and site configuration
pub mod theme;

/// In-memory destination tree
pub mod vfs;

/// Deterministic walk over one theme layer
pub mod walker;
