use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, LevelFilter};

use theme_compose::config::{Cli, Config};
use theme_compose::error::ComposeError;
use theme_compose::exclude::NESTED_THEMES_DIR;
use theme_compose::export::export_tree;
use theme_compose::resolver::compose_site;
use theme_compose::theme::JsonConfig;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_cli(cli)?;
    init_logging(config.verbose);

    if !config.project_root.is_dir() {
        bail!("Project root not found: {}", config.project_root.display());
    }

    if let Some(out) = &config.out {
        let themes_dir = config.project_root.join(NESTED_THEMES_DIR);
        let out = out.canonicalize().unwrap_or_else(|_| out.clone());
        if out == config.project_root || out.starts_with(&themes_dir) {
            bail!(
                "Refusing to export into {}: choose a directory outside the project sources",
                out.display()
            );
        }
    }

    // Setup Ctrl+C handler
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    // Configure Rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build_global()
        .ok();

    debug!(
        "Composing themes for {} with {} worker(s)",
        config.project_root.display(),
        config.jobs
    );

    let configs = JsonConfig::new(config.config_file.clone());
    let composition = match compose_site(&config.project_root, &configs, config.theme.as_ref()) {
        Ok(composition) => composition,
        Err(e) if e.is_config_error() => {
            return Err(e).context("Could not resolve theme chain");
        }
        Err(e) => {
            let e = anyhow::Error::new(e).context("Could not build themes");
            eprintln!("Error: {e:#}");
            return Ok(ExitCode::from(1));
        }
    };

    let stats = &composition.stats;
    let chain: Vec<&str> = composition.chain.iter().map(|t| t.as_str()).collect();
    println!(
        "Composed {} files from {} theme(s) in {:.2}s ({} overridden)",
        composition.tree.file_count(),
        chain.len(),
        composition.duration.as_secs_f64(),
        stats.overrides
    );
    println!("  chain: {}", chain.join(" -> "));
    println!(
        "  copied {} files ({} bytes), {} directories",
        stats.files_copied, stats.bytes_copied, stats.directories
    );

    if config.list {
        for path in composition.tree.files().map(|(p, _)| p) {
            println!("{path}");
        }
    }

    let Some(out) = &config.out else {
        return Ok(ExitCode::SUCCESS);
    };

    let start = Instant::now();
    let progress = if config.verbose {
        let pb = ProgressBar::new(composition.tree.file_count() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let result = export_tree(&composition.tree, out, &shutdown, progress.as_ref());

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match result {
        Ok((files, bytes)) => {
            println!(
                "Wrote {} files ({} bytes) to {} in {:.2}s",
                files,
                bytes,
                out.display(),
                start.elapsed().as_secs_f64()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(ComposeError::Cancelled) => {
            eprintln!("\nExport cancelled");
            Ok(ExitCode::from(130))
        }
        Err(e) => {
            let e = anyhow::Error::new(e).context("Could not export themes");
            eprintln!("Error: {e:#}");
            Ok(ExitCode::from(1))
        }
    }
}
