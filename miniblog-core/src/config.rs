//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Main configuration struct matching the miniblog.yml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub paths: PathsConfig,
    pub content: ContentConfig,
    pub build: BuildConfig,
    pub server: ServerConfig,

    // Directory relative paths resolve against
    #[serde(skip)]
    root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "miniblog".to_string(),
            base_url: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub content: PathBuf,
    pub templates: PathBuf,
    pub output: PathBuf,
    pub media: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: PathBuf::from("content"),
            templates: PathBuf::from("templates"),
            output: PathBuf::from("out"),
            media: PathBuf::from("media"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// URL pattern for items without an explicit `path`; `{slug}` is replaced
    pub url_pattern: String,

    /// Template used when a sidecar has no `template` key
    pub default_template: String,

    /// Number of entries in the `latest_items` template global
    pub latest_count: usize,

    /// Keep empty tokens produced by consecutive tag delimiters
    pub keep_empty_tags: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            url_pattern: "/blog/{slug}/".to_string(),
            default_template: "default.html".to_string(),
            latest_count: 10,
            keep_empty_tags: false,
        }
    }
}

impl ContentConfig {
    /// Apply the URL pattern to a slug
    pub fn url_for_slug(&self, slug: &str) -> String {
        self.url_pattern.replace("{slug}", slug)
    }
}

/// What `SiteNamespace::get_all` does when two providers emit the same URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateUrlPolicy {
    /// Emit every occurrence; the last one written to disk wins
    #[default]
    Keep,
    /// Emit the first occurrence and skip later ones
    First,
    /// Treat a repeated URL as a build error
    Error,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub duplicate_urls: DuplicateUrlPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub media_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            media_prefix: "/media/".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;

        config.root = path.parent().map(Path::to_path_buf);

        Ok(config)
    }

    /// Default configuration with relative paths resolved against `root`
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Load `path` if it exists, otherwise fall back to defaults rooted at
    /// `fallback_root`.
    pub fn load_or_default<P: AsRef<Path>, R: AsRef<Path>>(
        path: P,
        fallback_root: R,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::rooted_at(fallback_root))
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.content.url_pattern.contains("{slug}") {
            return Err(ConfigError::Invalid {
                field: "content.url_pattern".to_string(),
                reason: "must contain {slug}".to_string(),
            });
        }
        Ok(())
    }

    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.templates)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    pub fn media_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.media)
    }

    /// Media URL prefix with leading and trailing slash ("/media/")
    pub fn media_prefix(&self) -> String {
        normalize_prefix(&self.server.media_prefix)
    }

    /// Resolve a path relative to the config root
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(root) = &self.root {
            root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// Ensure URL prefixes have a leading and trailing slash
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.content.url_pattern, "/blog/{slug}/");
        assert_eq!(config.content.default_template, "default.html");
        assert_eq!(config.content.latest_count, 10);
        assert!(!config.content.keep_empty_tags);
        assert_eq!(config.build.duplicate_urls, DuplicateUrlPolicy::Keep);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.media_prefix(), "/media/");
    }

    #[test]
    fn test_partial_file_keeps_defaults_and_resolves_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("miniblog.yml");
        fs::write(
            &path,
            r#"
site:
  title: "My Blog"
paths:
  output: "public"
build:
  duplicate_urls: error
server:
  media_prefix: static
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.site.title, "My Blog");
        assert_eq!(config.site.base_url, "/");
        assert_eq!(config.output_dir(), dir.path().join("public"));
        assert_eq!(config.content_dir(), dir.path().join("content"));
        assert_eq!(config.build.duplicate_urls, DuplicateUrlPolicy::Error);
        assert_eq!(config.media_prefix(), "/static/");
    }

    #[test]
    fn test_url_pattern_requires_slug() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("miniblog.yml");
        fs::write(&path, "content:\n  url_pattern: /posts/\n").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_url_for_slug() {
        let content = ContentConfig::default();
        assert_eq!(content.url_for_slug("hello"), "/blog/hello/");
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("media"), "/media/");
        assert_eq!(normalize_prefix("/media"), "/media/");
        assert_eq!(normalize_prefix("//media//"), "/media/");
        assert_eq!(normalize_prefix(""), "/");
    }
}
