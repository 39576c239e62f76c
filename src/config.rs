//! CLI configuration and runtime settings for theme composition.

use clap::Parser;
use std::path::PathBuf;

use crate::theme::{ThemeName, SITE_CONFIG_FILE};

/// Compose inherited site themes into a single file tree
#[derive(Parser, Debug)]
#[command(name = "theme-compose")]
#[command(version)]
#[command(about = "Compose inherited site themes into a single file tree")]
pub struct Cli {
    /// Project root directory
    #[arg(default_value = ".")]
    pub project_root: PathBuf,

    /// Theme to compose instead of the one enabled in the site config
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Site config file name, read from the project and every theme
    #[arg(short, long, default_value = SITE_CONFIG_FILE)]
    pub config: String,

    /// Write the composed tree into this directory
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Print every composed path
    #[arg(short, long)]
    pub list: bool,

    /// Number of parallel workers
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub jobs: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Runtime configuration parsed from CLI
#[derive(Debug, Clone)]
pub struct Config {
    /// Project root directory
    pub project_root: PathBuf,
    /// Theme override (None = use the enabled theme)
    pub theme: Option<ThemeName>,
    /// Config file name
    pub config_file: String,
    /// Export directory
    pub out: Option<PathBuf>,
    pub list: bool,
    /// Number of parallel workers
    pub jobs: usize,
    /// Enable verbose output
    pub verbose: bool,
}

impl Config {
    /// Create Config from CLI arguments
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);

        let theme = match cli.theme {
            Some(name) => match ThemeName::parse(name.trim()) {
                Some(theme) => Some(theme),
                None => anyhow::bail!("invalid theme name '{}': expected a single directory name", name),
            },
            None => None,
        };

        if cli.config.trim().is_empty() {
            anyhow::bail!("config file name cannot be empty");
        }

        Ok(Config {
            project_root,
            theme,
            config_file: cli.config,
            out: cli.out,
            list: cli.list,
            jobs: cli.jobs.max(1),
            verbose: cli.verbose,
        })
    }
}
