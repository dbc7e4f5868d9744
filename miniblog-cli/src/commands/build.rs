//! Build command implementation.

use anyhow::{Context, Result};
use miniblog_core::{BuildReport, Config, SiteBuilder};
use std::path::Path;

/// Load the configuration at `config_path`, or defaults rooted next to it
/// when the file does not exist.
pub fn load_config(config_path: &Path) -> Result<Config> {
    let fallback_root = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tracing::info!("Loading config from {:?}", config_path);
    Config::load_or_default(config_path, fallback_root).context("Failed to load configuration")
}

/// Build the static site into the configured output directory
pub fn build_site(config_path: &Path) -> Result<BuildReport> {
    let config = load_config(config_path)?;
    tracing::info!("Building site: {}", config.site.title);

    let report = SiteBuilder::new(config)
        .build()
        .context("Failed to build site")?;

    println!(
        "✓ Wrote {} pages and {} media files to {:?}",
        report.pages, report.media_files, report.output_dir
    );
    Ok(report)
}
