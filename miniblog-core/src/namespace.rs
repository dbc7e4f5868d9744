//! The namespace protocol shared by every URL provider of a site.

use crate::markdown::{MarkdownProcessor, MarkupConverter};
use crate::site::SiteError;
use crate::source::{FsReader, SourceReader};
use miniblog_render::TemplateEnv;
use serde::Serialize;

/// A provider of URLs.
///
/// `dispatch` answers `Ok(None)` for URLs it does not own so the caller can
/// try the next provider.
pub trait Namespace: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render the page at `url`, if this namespace owns it
    fn dispatch(&self, url: &str, ctx: &RenderContext) -> Result<Option<String>, SiteError>;

    /// Every URL this namespace can dispatch, in enumeration order
    fn urls(&self) -> Vec<String>;

    /// Template globals this namespace contributes
    fn mixins(&self) -> Vec<Mixin> {
        Vec::new()
    }
}

/// A named, read-only template global
#[derive(Debug, Clone)]
pub struct Mixin {
    pub name: &'static str,
    pub value: serde_json::Value,
}

impl Mixin {
    /// Snapshot `value` under `name`.
    ///
    /// A value that cannot be serialized becomes `null` and is logged.
    pub fn new<T: Serialize>(name: &'static str, value: &T) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|err| {
            tracing::warn!("Template global {} could not be serialized: {}", name, err);
            serde_json::Value::Null
        });
        Self { name, value }
    }
}

/// The collaborators rendering needs: templates, file reads and markup
/// conversion.
pub struct RenderContext {
    pub templates: TemplateEnv,
    pub reader: Box<dyn SourceReader>,
    pub markup: Box<dyn MarkupConverter>,
}

impl RenderContext {
    /// Filesystem reads and Markdown conversion
    pub fn new(templates: TemplateEnv) -> Self {
        Self {
            templates,
            reader: Box::new(FsReader),
            markup: Box::new(MarkdownProcessor::new()),
        }
    }

    pub fn with_reader(mut self, reader: impl SourceReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn with_markup(mut self, markup: impl MarkupConverter + 'static) -> Self {
        self.markup = Box::new(markup);
        self
    }
}
