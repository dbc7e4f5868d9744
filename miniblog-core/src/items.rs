//! The item namespace: every content item found under the content root.

use crate::config::ContentConfig;
use crate::item::{ContentItem, ItemError, ItemId, ItemSummary, META_SUFFIX};
use crate::namespace::{Mixin, Namespace, RenderContext};
use crate::site::SiteError;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum NamespaceError {
    #[error("Duplicate page on path {url}: {} and {}", first.display(), second.display())]
    DuplicatePath {
        url: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error("Failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Registry of content items, unique by URL
pub struct ItemNamespace {
    items: Vec<ContentItem>,
    by_url: HashMap<String, ItemId>,
    sorted: Vec<ItemId>,
    latest_count: usize,
}

impl ItemNamespace {
    /// An empty namespace
    pub fn new(latest_count: usize) -> Self {
        Self {
            items: Vec::new(),
            by_url: HashMap::new(),
            sorted: Vec::new(),
            latest_count,
        }
    }

    /// Discover and load every item under `content_root`, then sort and link
    /// them. Any item failure aborts the whole population.
    pub fn populate(
        content_root: &Path,
        ctx: &RenderContext,
        content: &ContentConfig,
    ) -> Result<Self, NamespaceError> {
        let mut namespace = Self::new(content.latest_count);

        for path in discover_content_files(content_root)? {
            tracing::debug!("Discovered {:?}", path);
            let item = ContentItem::load(&path, ctx.reader.as_ref(), &ctx.templates, content)?;
            namespace.add(item)?;
        }

        namespace.link();
        tracing::info!("Loaded {} content items", namespace.len());
        Ok(namespace)
    }

    /// Register an item; its URL must not be taken yet.
    ///
    /// Adding invalidates the chronological order until [`ItemNamespace::link`]
    /// runs again.
    pub fn add(&mut self, item: ContentItem) -> Result<ItemId, NamespaceError> {
        if let Some(existing) = self.by_url.get(item.url()) {
            return Err(NamespaceError::DuplicatePath {
                url: item.url().to_string(),
                first: self.items[existing.0].source_path().to_path_buf(),
                second: item.source_path().to_path_buf(),
            });
        }

        let id = ItemId(self.items.len());
        self.by_url.insert(item.url().to_string(), id);
        self.items.push(item);
        Ok(id)
    }

    /// Sort by date descending and set the prev/next links.
    ///
    /// Undated items sort as the oldest; ties keep discovery order.
    pub fn link(&mut self) {
        let mut sorted: Vec<ItemId> = (0..self.items.len()).map(ItemId).collect();
        sorted.sort_by(|a, b| sort_key(&self.items[b.0]).cmp(&sort_key(&self.items[a.0])));

        for (pos, id) in sorted.iter().enumerate() {
            let item = &mut self.items[id.0];
            item.prev = pos.checked_sub(1).map(|p| sorted[p]);
            item.next = sorted.get(pos + 1).copied();
        }

        self.sorted = sorted;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: ItemId) -> &ContentItem {
        &self.items[id.0]
    }

    /// Look up the item registered at `url`
    pub fn get(&self, url: &str) -> Option<&ContentItem> {
        self.by_url.get(url).map(|id| self.item(*id))
    }

    /// Items in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.iter()
    }

    /// Every item, newest first
    pub fn sorted_by_date_desc(&self) -> impl Iterator<Item = &ContentItem> {
        self.sorted.iter().map(move |id| self.item(*id))
    }

    /// Item handles, newest first
    pub fn sorted_ids(&self) -> &[ItemId] {
        &self.sorted
    }

    /// The `n` newest items that are not static
    pub fn latest(&self, n: usize) -> Vec<&ContentItem> {
        self.sorted_by_date_desc()
            .filter(|item| !item.metadata().is_static)
            .take(n)
            .collect()
    }

    pub fn prev_of(&self, item: &ContentItem) -> Option<&ContentItem> {
        item.prev().map(|id| self.item(id))
    }

    pub fn next_of(&self, item: &ContentItem) -> Option<&ContentItem> {
        item.next().map(|id| self.item(id))
    }

    /// Render an item (memoized) with its chronological neighbours in view
    pub fn render<'a>(
        &'a self,
        item: &'a ContentItem,
        ctx: &RenderContext,
    ) -> Result<&'a str, ItemError> {
        let view = item.view(self.prev_of(item), self.next_of(item));
        item.render(&view, &ctx.templates, ctx.reader.as_ref(), ctx.markup.as_ref())
    }
}

fn sort_key(item: &ContentItem) -> NaiveDateTime {
    item.metadata().date.unwrap_or(NaiveDateTime::MIN)
}

/// Every non-sidecar, non-hidden file under `root`, sorted by path
fn discover_content_files(root: &Path) -> Result<Vec<PathBuf>, NamespaceError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = entry.map_err(|source| NamespaceError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(META_SUFFIX) {
            continue;
        }
        files.push(entry.into_path());
    }

    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

impl Namespace for ItemNamespace {
    fn name(&self) -> &'static str {
        "items"
    }

    fn dispatch(&self, url: &str, ctx: &RenderContext) -> Result<Option<String>, SiteError> {
        match self.get(url) {
            Some(item) => Ok(Some(self.render(item, ctx)?.to_string())),
            None => Ok(None),
        }
    }

    fn urls(&self) -> Vec<String> {
        self.items.iter().map(|item| item.url().to_string()).collect()
    }

    fn mixins(&self) -> Vec<Mixin> {
        let latest: Vec<ItemSummary> = self
            .latest(self.latest_count)
            .into_iter()
            .map(ContentItem::summary)
            .collect();
        vec![Mixin::new("latest_items", &latest)]
    }
}
