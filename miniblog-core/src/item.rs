//! Content items: one source file paired with its sidecar metadata.

use crate::categories::category_url;
use crate::config::ContentConfig;
use crate::markdown::MarkupConverter;
use crate::metadata::{parse_metadata, FieldContext, Metadata, MetadataError};
use crate::source::SourceReader;
use miniblog_render::{RenderError, TemplateEnv};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix of sidecar metadata files
pub const META_SUFFIX: &str = ".meta";

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Missing metadata file for {}", path.display())]
    MissingMetadata { path: PathBuf },

    #[error("Invalid metadata in {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to render {}: {source}", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
}

/// Handle to an item within its owning namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub(crate) usize);

/// A single content file in the site
#[derive(Debug)]
pub struct ContentItem {
    source_path: PathBuf,
    metadata: Metadata,
    url: String,
    pub(crate) prev: Option<ItemId>,
    pub(crate) next: Option<ItemId>,
    rendered: OnceCell<String>,
}

/// Path of the sidecar belonging to `source_path`
pub fn meta_path_for(source_path: &Path) -> PathBuf {
    let mut meta = source_path.as_os_str().to_owned();
    meta.push(META_SUFFIX);
    PathBuf::from(meta)
}

impl ContentItem {
    /// Load an item and parse its sidecar.
    ///
    /// The body itself is not read until [`ContentItem::render`].
    pub fn load(
        source_path: &Path,
        reader: &dyn SourceReader,
        templates: &TemplateEnv,
        content: &ContentConfig,
    ) -> Result<Self, ItemError> {
        let meta_path = meta_path_for(source_path);
        let text = reader.read_to_string(&meta_path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                ItemError::MissingMetadata {
                    path: source_path.to_path_buf(),
                }
            } else {
                ItemError::Io {
                    path: meta_path.clone(),
                    source: err,
                }
            }
        })?;

        let ctx = FieldContext {
            source_path,
            templates,
            default_template: &content.default_template,
            keep_empty_tags: content.keep_empty_tags,
        };
        let metadata = parse_metadata(&text, &ctx).map_err(|source| ItemError::Metadata {
            path: meta_path.clone(),
            source,
        })?;

        Ok(Self::from_metadata(source_path.to_path_buf(), metadata, content))
    }

    /// Build an item from already parsed metadata
    pub fn from_metadata(
        source_path: PathBuf,
        metadata: Metadata,
        content: &ContentConfig,
    ) -> Self {
        let url = match &metadata.path {
            Some(path) => path.clone(),
            None => content.url_for_slug(&metadata.slug),
        };

        Self {
            source_path,
            metadata,
            url,
            prev: None,
            next: None,
            rendered: OnceCell::new(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Canonical URL: the `path` override, else the configured slug pattern
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn prev(&self) -> Option<ItemId> {
        self.prev
    }

    pub fn next(&self) -> Option<ItemId> {
        self.next
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered.get().is_some()
    }

    /// Render the item through its template, once.
    ///
    /// Later calls return the stored HTML without reading or converting
    /// anything.
    pub fn render(
        &self,
        view: &ItemView<'_>,
        templates: &TemplateEnv,
        reader: &dyn SourceReader,
        markup: &dyn MarkupConverter,
    ) -> Result<&str, ItemError> {
        self.rendered
            .get_or_try_init(|| {
                tracing::debug!("Rendering {}", self.url);
                let raw = reader
                    .read_to_string(&self.source_path)
                    .map_err(|source| ItemError::Io {
                        path: self.source_path.clone(),
                        source,
                    })?;
                let content = markup.to_html(&raw);
                templates
                    .render(
                        &self.metadata.template,
                        ItemContext {
                            item: view,
                            content: &content,
                        },
                    )
                    .map_err(|source| ItemError::Render {
                        path: self.source_path.clone(),
                        source,
                    })
            })
            .map(String::as_str)
    }

    /// Short form used in listings and template globals
    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            title: self.metadata.title.clone(),
            url: self.url.clone(),
            date: self.metadata.date.map(|d| d.format("%Y-%m-%d").to_string()),
            category: self.metadata.category.clone(),
            tags: self.metadata.tags.clone(),
            is_static: self.metadata.is_static,
        }
    }

    /// Full template view of this item, with its chronological neighbours
    pub fn view<'a>(
        &'a self,
        prev: Option<&ContentItem>,
        next: Option<&ContentItem>,
    ) -> ItemView<'a> {
        let meta = &self.metadata;
        ItemView {
            title: &meta.title,
            date: meta.date.map(|d| d.format("%Y-%m-%d").to_string()),
            datetime: meta.date.map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string()),
            tags: &meta.tags,
            category: meta.category.as_deref(),
            category_url: meta.category.as_deref().map(category_url),
            slug: &meta.slug,
            url: &self.url,
            is_static: meta.is_static,
            prev: prev.map(ContentItem::summary),
            next: next.map(ContentItem::summary),
        }
    }
}

/// Read-only snapshot of an item for listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSummary {
    pub title: String,
    pub url: String,
    pub date: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_static: bool,
}

/// The `item` value handed to templates
#[derive(Debug, Clone, Serialize)]
pub struct ItemView<'a> {
    pub title: &'a str,
    pub date: Option<String>,
    pub datetime: Option<String>,
    pub tags: &'a [String],
    pub category: Option<&'a str>,
    pub category_url: Option<String>,
    pub slug: &'a str,
    pub url: &'a str,
    pub is_static: bool,
    pub prev: Option<ItemSummary>,
    pub next: Option<ItemSummary>,
}

/// Render context of an item page: `{item, content}`
#[derive(Serialize)]
struct ItemContext<'a, 'b> {
    item: &'a ItemView<'b>,
    content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownProcessor;
    use crate::source::FsReader;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct CountingReader {
        body_reads: AtomicUsize,
        body_path: PathBuf,
    }

    impl SourceReader for CountingReader {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            if path == self.body_path {
                self.body_reads.fetch_add(1, Ordering::SeqCst);
            }
            fs::read_to_string(path)
        }
    }

    struct CountingMarkup(AtomicUsize);

    impl MarkupConverter for CountingMarkup {
        fn to_html(&self, text: &str) -> String {
            self.0.fetch_add(1, Ordering::SeqCst);
            MarkdownProcessor::new().convert(text)
        }
    }

    #[test]
    fn test_meta_path_appends_suffix() {
        assert_eq!(
            meta_path_for(Path::new("/c/post.md")),
            PathBuf::from("/c/post.md.meta")
        );
    }

    #[test]
    fn test_missing_sidecar_is_an_error() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("orphan.md");
        fs::write(&source, "body").unwrap();

        let err = ContentItem::load(
            &source,
            &FsReader,
            &TemplateEnv::new(None),
            &ContentConfig::default(),
        )
        .unwrap_err();
        match err {
            ItemError::MissingMetadata { path } => assert_eq!(path, source),
            other => panic!("expected MissingMetadata, got {:?}", other),
        }
    }

    #[test]
    fn test_url_default_pattern_and_override() {
        let content = ContentConfig::default();
        let mut meta = Metadata {
            slug: "hello".into(),
            ..Metadata::default()
        };
        let item = ContentItem::from_metadata("hello.md".into(), meta.clone(), &content);
        assert_eq!(item.url(), "/blog/hello/");
        assert_eq!(item.url(), item.url());

        meta.path = Some("/about/".into());
        let item = ContentItem::from_metadata("hello.md".into(), meta, &content);
        assert_eq!(item.url(), "/about/");
    }

    #[test]
    fn test_render_is_memoized() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("post.md");
        fs::write(&source, "Hello *world*").unwrap();
        fs::write(meta_path_for(&source), "title: Post").unwrap();

        let templates = TemplateEnv::new(None);
        let reader = CountingReader {
            body_reads: AtomicUsize::new(0),
            body_path: source.clone(),
        };
        let markup = CountingMarkup(AtomicUsize::new(0));
        let content = ContentConfig::default();
        let item = ContentItem::load(&source, &reader, &templates, &content).unwrap();
        assert!(!item.is_rendered());

        let view = item.view(None, None);
        let first = item.render(&view, &templates, &reader, &markup).unwrap().to_string();
        let second = item.render(&view, &templates, &reader, &markup).unwrap().to_string();

        assert_eq!(first, second);
        assert!(first.contains("<em>world</em>"));
        assert!(first.contains("<h1>Post</h1>"));
        assert_eq!(reader.body_reads.load(Ordering::SeqCst), 1);
        assert_eq!(markup.0.load(Ordering::SeqCst), 1);
        assert!(item.is_rendered());
    }

    #[test]
    fn test_view_exposes_category_url_and_neighbours() {
        let content = ContentConfig::default();
        let item = ContentItem::from_metadata(
            "a.md".into(),
            Metadata {
                title: "A".into(),
                slug: "a".into(),
                category: Some("Open Source".into()),
                ..Metadata::default()
            },
            &content,
        );
        let other = ContentItem::from_metadata(
            "b.md".into(),
            Metadata {
                title: "B".into(),
                slug: "b".into(),
                ..Metadata::default()
            },
            &content,
        );

        let view = item.view(Some(&other), None);
        assert_eq!(view.category_url.as_deref(), Some("/category/open-source/"));
        assert_eq!(view.prev.as_ref().map(|p| p.url.as_str()), Some("/blog/b/"));
        assert!(view.next.is_none());
    }
}
