//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"site:
  title: "My miniblog"
  base_url: "/"

paths:
  content: content
  templates: templates
  output: out
  media: media

content:
  url_pattern: "/blog/{slug}/"
  default_template: default.html
  latest_count: 10

server:
  port: 5000
  media_prefix: "/media/"
"#;

const SAMPLE_POST: &str = r#"# Hello, world

This is your first miniblog post. Its metadata lives next to it in
`hello-world.md.meta`.

Run `miniblog serve` to preview the site and `miniblog build` to write it
to `out/`.
"#;

const SAMPLE_META: &str = "title: Hello, world
date: 2025-01-01
category: General
tags: miniblog, intro
";

/// Initialize a new miniblog project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_if_missing(&root.join("miniblog.yml"), DEFAULT_CONFIG)?;
    scaffold(root)?;

    println!("✓ miniblog initialized in {:?}", root);
    println!("  - Edit miniblog.yml to customize site metadata");
    println!("  - Write posts in content/, each with a .meta sidecar");
    Ok(())
}

fn scaffold(root: &Path) -> Result<()> {
    for name in ["content", "templates", "media"] {
        let dir = root.join(name);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }

    let content = root.join("content");
    write_if_missing(&content.join("hello-world.md"), SAMPLE_POST)?;
    write_if_missing(&content.join("hello-world.md.meta"), SAMPLE_META)?;
    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        println!("{:?} already exists, leaving it alone", path);
        return Ok(());
    }

    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    println!("Created {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use miniblog_core::Config;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_a_loadable_project() {
        let dir = tempdir().unwrap();
        init_project(Some(dir.path())).unwrap();

        let config = Config::from_file(dir.path().join("miniblog.yml")).unwrap();
        assert_eq!(config.site.title, "My miniblog");
        assert!(config.content_dir().join("hello-world.md.meta").exists());
        assert!(config.media_dir().is_dir());
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("miniblog.yml");
        fs::write(&config_path, "site:\n  title: Mine\n").unwrap();

        init_project(Some(dir.path())).unwrap();
        assert_eq!(fs::read_to_string(&config_path).unwrap(), "site:\n  title: Mine\n");
    }
}
