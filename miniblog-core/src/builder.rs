//! Static site building: write every page of a site namespace to disk.

use crate::config::Config;
use crate::items::NamespaceError;
use crate::site::{SiteError, SiteNamespace};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to load site: {0}")]
    Load(#[from] NamespaceError),

    #[error("Failed to render page: {0}")]
    Site(#[from] SiteError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy media from {}: {source}", root.display())]
    Media {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// What a build produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub media_files: usize,
    pub output_dir: PathBuf,
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Load the site and write it to the configured output directory
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let site = SiteNamespace::load(&self.config)?;
        self.write(&site)
    }

    /// Write an already loaded site
    pub fn write(&self, site: &SiteNamespace) -> Result<BuildReport, BuildError> {
        let output_dir = self.config.output_dir();
        let pages = write_pages(site, &output_dir)?;

        let media_dir = self.config.media_dir();
        let media_files = if media_dir.is_dir() {
            let target = output_dir.join(self.config.media_prefix().trim_matches('/'));
            copy_tree(&media_dir, &target)?
        } else {
            tracing::debug!("No media directory at {:?}", media_dir);
            0
        };

        tracing::info!("✓ Built {} pages", pages);
        tracing::info!("✓ Output written to {:?}", output_dir);

        Ok(BuildReport {
            pages,
            media_files,
            output_dir,
        })
    }
}

/// Map a URL to its file below `output_dir`.
///
/// A trailing slash maps to `index.html`; `.` and `..` segments are dropped.
pub fn output_path_for_url(output_dir: &Path, url: &str) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    for segment in url.split('/') {
        match segment {
            "" | "." | ".." => continue,
            s => path.push(s),
        }
    }
    if url.ends_with('/') || url.is_empty() {
        path.push("index.html");
    }
    path
}

/// Render and write every page of `site`, returning the number written
pub fn write_pages(site: &SiteNamespace, output_dir: &Path) -> Result<usize, BuildError> {
    let mut written = 0;

    for page in site.get_all() {
        let (url, html) = page?;
        let path = output_path_for_url(output_dir, &url);
        write_file(&path, html.as_bytes())?;
        tracing::info!("Writing {}...", url);
        written += 1;
    }

    Ok(written)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    let io_err = |source: std::io::Error| BuildError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

/// Copy every file under `source` into `target`, keeping relative paths
fn copy_tree(source: &Path, target: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|err| BuildError::Media {
            root: source.to_path_buf(),
            source: err,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
        if rel.components().any(|c| matches!(c, Component::ParentDir)) {
            continue;
        }
        let dest = target.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|err| BuildError::Write {
                path: parent.to_path_buf(),
                source: err,
            })?;
        }
        fs::copy(entry.path(), &dest).map_err(|err| BuildError::Write {
            path: dest.clone(),
            source: err,
        })?;
        copied += 1;
    }

    tracing::debug!("Copied {} media files to {:?}", copied, target);
    Ok(copied)
}
