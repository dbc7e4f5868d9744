//! # miniblog-core
//!
//! Core library for the miniblog site compiler.
//!
//! This crate discovers content items and their sidecar metadata, orders and
//! groups them, and resolves URLs to rendered pages through a list of
//! namespaces. The static builder writes every page of a [`SiteNamespace`]
//! to disk.

pub mod builder;
pub mod categories;
pub mod config;
pub mod item;
pub mod items;
pub mod markdown;
pub mod metadata;
pub mod namespace;
pub mod site;
pub mod slug;
pub mod source;

pub use builder::{output_path_for_url, BuildError, BuildReport, SiteBuilder};
pub use categories::{Category, CategoryNamespace, CATEGORY_BASE};
pub use config::{Config, ConfigError, DuplicateUrlPolicy};
pub use item::{ContentItem, ItemError, ItemId, ItemSummary, META_SUFFIX};
pub use items::{ItemNamespace, NamespaceError};
pub use markdown::{MarkdownProcessor, MarkupConverter};
pub use metadata::{Metadata, MetadataError};
pub use namespace::{Mixin, Namespace, RenderContext};
pub use site::{SiteError, SiteNamespace};
pub use slug::category_slug;
pub use source::{FsReader, SourceReader};
