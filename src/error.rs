use std::path::PathBuf;
use thiserror::Error;

/// Theme composition error types
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Could not read site config: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid site config: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No theme enabled in {path}")]
    NoThemeEnabled { path: PathBuf },

    #[error("Invalid theme name '{name}' in {path}")]
    InvalidThemeName { name: String, path: PathBuf },

    #[error("Theme not found: {theme} (expected at {path})")]
    ThemeNotFound { theme: String, path: PathBuf },

    #[error("Could not walk theme {theme}")]
    Walk {
        theme: String,
        #[source]
        source: walkdir::Error,
    },

    #[error("Could not read theme file {path} in {theme}")]
    ReadFailed {
        theme: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Theme path is not valid UTF-8: {path}")]
    InvalidPath { path: PathBuf },

    #[error(
        "Path kind conflict at '{path}': already exists as a {existing}{}",
        .theme.as_deref().map(|t| format!(" (writing theme {t})")).unwrap_or_default()
    )]
    PathKindConflict {
        path: String,
        existing: &'static str,
        theme: Option<String>,
    },

    #[error("Cycle detected in theme chain: {cycle}")]
    CycleDetected { cycle: String },

    #[error("No space left on device for {path}")]
    DiskFull { path: PathBuf },

    #[error("Failed to create directory: {path}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComposeError {
    /// True for errors caused by the themes' configuration rather than I/O
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ComposeError::ConfigRead { .. }
                | ComposeError::ConfigParse { .. }
                | ComposeError::NoThemeEnabled { .. }
                | ComposeError::InvalidThemeName { .. }
                | ComposeError::ThemeNotFound { .. }
                | ComposeError::CycleDetected { .. }
        )
    }

    /// Attach the theme layer being copied to a path conflict
    pub fn with_theme(self, theme: &str) -> Self {
        match self {
            ComposeError::PathKindConflict { path, existing, .. } => {
                ComposeError::PathKindConflict {
                    path,
                    existing,
                    theme: Some(theme.to_string()),
                }
            }
            other => other,
        }
    }
}
