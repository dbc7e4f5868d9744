//! The category namespace, derived from an item namespace.
//!
//! Serves `/category/` (overview of all categories) and `/category/{slug}/`
//! (items of one category, newest first).

use crate::item::{ContentItem, ItemId, ItemSummary};
use crate::items::ItemNamespace;
use crate::namespace::{Mixin, Namespace, RenderContext};
use crate::site::SiteError;
use crate::slug::category_slug;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// URL of the category overview; category pages live below it
pub const CATEGORY_BASE: &str = "/category/";

pub const OVERVIEW_TEMPLATE: &str = "categories.html";
pub const CATEGORY_TEMPLATE: &str = "category.html";

/// URL of the page listing category `name`
pub fn category_url(name: &str) -> String {
    format!("{}{}/", CATEGORY_BASE, category_slug(name))
}

/// A group of items sharing a category
#[derive(Debug, Clone)]
pub struct Category {
    /// Display name as first encountered
    pub name: String,
    pub slug: String,
    pub url: String,
    pub members: Vec<ItemId>,
}

/// Template view of a category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub name: String,
    pub slug: String,
    pub url: String,
    pub count: usize,
    pub items: Vec<ItemSummary>,
}

pub struct CategoryNamespace {
    items: Arc<ItemNamespace>,
    categories: Vec<Category>,
    by_slug: HashMap<String, usize>,
}

impl CategoryNamespace {
    /// Group the items of `items` by category, walking them newest first
    pub fn new(items: Arc<ItemNamespace>) -> Self {
        let mut categories: Vec<Category> = Vec::new();
        let mut by_slug: HashMap<String, usize> = HashMap::new();

        for &id in items.sorted_ids() {
            let Some(name) = items.item(id).metadata().category.as_deref() else {
                continue;
            };
            let slug = category_slug(name);
            let index = *by_slug.entry(slug.clone()).or_insert_with(|| {
                categories.push(Category {
                    name: name.to_string(),
                    url: format!("{}{}/", CATEGORY_BASE, slug),
                    slug,
                    members: Vec::new(),
                });
                categories.len() - 1
            });
            categories[index].members.push(id);
        }

        tracing::info!("Grouped items into {} categories", categories.len());
        Self {
            items,
            categories,
            by_slug,
        }
    }

    /// Categories in first-encountered order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, slug: &str) -> Option<&Category> {
        self.by_slug.get(slug).map(|&i| &self.categories[i])
    }

    pub fn members<'a>(&'a self, category: &'a Category) -> impl Iterator<Item = &'a ContentItem> {
        category.members.iter().map(move |&id| self.items.item(id))
    }

    pub fn view(&self, category: &Category) -> CategoryView {
        CategoryView {
            name: category.name.clone(),
            slug: category.slug.clone(),
            url: category.url.clone(),
            count: category.members.len(),
            items: self.members(category).map(ContentItem::summary).collect(),
        }
    }

    fn views(&self) -> Vec<CategoryView> {
        self.categories.iter().map(|c| self.view(c)).collect()
    }

    pub fn render_overview(&self, ctx: &RenderContext) -> Result<String, SiteError> {
        let html = ctx
            .templates
            .render(OVERVIEW_TEMPLATE, json!({ "categories": self.views() }))?;
        Ok(html)
    }

    pub fn render_category(
        &self,
        category: &Category,
        ctx: &RenderContext,
    ) -> Result<String, SiteError> {
        let html = ctx
            .templates
            .render(CATEGORY_TEMPLATE, json!({ "category": self.view(category) }))?;
        Ok(html)
    }
}

impl Namespace for CategoryNamespace {
    fn name(&self) -> &'static str {
        "categories"
    }

    fn dispatch(&self, url: &str, ctx: &RenderContext) -> Result<Option<String>, SiteError> {
        let Some(rest) = url.strip_prefix(CATEGORY_BASE) else {
            return Ok(None);
        };
        if rest.is_empty() {
            return self.render_overview(ctx).map(Some);
        }

        // Slugs may themselves contain '/', so match the whole remainder
        let Some(slug) = rest.strip_suffix('/') else {
            return Ok(None);
        };
        match self.get(slug) {
            Some(category) => self.render_category(category, ctx).map(Some),
            None => Ok(None),
        }
    }

    fn urls(&self) -> Vec<String> {
        std::iter::once(CATEGORY_BASE.to_string())
            .chain(self.categories.iter().map(|c| c.url.clone()))
            .collect()
    }

    fn mixins(&self) -> Vec<Mixin> {
        vec![Mixin::new("categories", &self.views())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentConfig;
    use crate::metadata::Metadata;
    use chrono::NaiveDate;
    use miniblog_render::TemplateEnv;

    fn item(slug: &str, day: u32, category: Option<&str>) -> ContentItem {
        let metadata = Metadata {
            title: slug.to_string(),
            slug: slug.to_string(),
            template: "default.html".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 1, day).and_then(|d| d.and_hms_opt(0, 0, 0)),
            category: category.map(str::to_string),
            ..Metadata::default()
        };
        let source = std::path::PathBuf::from(format!("{}.md", slug));
        ContentItem::from_metadata(source, metadata, &ContentConfig::default())
    }

    fn sample() -> CategoryNamespace {
        let mut items = ItemNamespace::new(10);
        items.add(item("oldest", 1, Some("Open Source"))).unwrap();
        items.add(item("middle", 2, None)).unwrap();
        items.add(item("newest", 3, Some("open source"))).unwrap();
        items.add(item("other", 4, Some("Rust"))).unwrap();
        items.link();
        CategoryNamespace::new(Arc::new(items))
    }

    #[test]
    fn test_groups_by_slug_keeping_first_name() {
        let ns = sample();
        let names: Vec<_> = ns.categories().iter().map(|c| c.name.as_str()).collect();
        // Walked newest first, so "Rust" and the lowercase spelling come first
        assert_eq!(names, vec!["Rust", "open source"]);

        let open_source = ns.get("open-source").unwrap();
        assert_eq!(open_source.url, "/category/open-source/");
        let members: Vec<_> = ns.members(open_source).map(|i| i.url()).collect();
        assert_eq!(members, vec!["/blog/newest/", "/blog/oldest/"]);
    }

    #[test]
    fn test_uncategorized_items_are_omitted() {
        let ns = sample();
        let listed: Vec<_> = ns
            .categories()
            .iter()
            .flat_map(|c| ns.members(c).map(|i| i.url().to_string()))
            .collect();
        assert!(!listed.contains(&"/blog/middle/".to_string()));
        assert_eq!(listed.len(), 3);
    }

    #[test]
    fn test_urls_start_with_overview() {
        let ns = sample();
        assert_eq!(
            ns.urls(),
            vec!["/category/", "/category/rust/", "/category/open-source/"]
        );
    }

    #[test]
    fn test_dispatch_shapes() {
        let ns = sample();
        let ctx = RenderContext::new(TemplateEnv::new(None));

        let overview = ns.dispatch("/category/", &ctx).unwrap().unwrap();
        assert!(overview.contains(">open source</a> (2)"));
        assert!(overview.contains(">Rust</a> (1)"));

        let detail = ns.dispatch("/category/rust/", &ctx).unwrap().unwrap();
        assert!(detail.contains("<h1>Rust</h1>"));
        assert!(detail.contains(">other</a>"));

        assert!(ns.dispatch("/category/unknown/", &ctx).unwrap().is_none());
        assert!(ns.dispatch("/category/rust/extra/", &ctx).unwrap().is_none());
        assert!(ns.dispatch("/category/rust", &ctx).unwrap().is_none());
        assert!(ns.dispatch("/blog/other/", &ctx).unwrap().is_none());
    }

    #[test]
    fn test_mixin_lists_categories() {
        let ns = sample();
        let mixins = ns.mixins();
        assert_eq!(mixins.len(), 1);
        assert_eq!(mixins[0].name, "categories");
        assert_eq!(mixins[0].value[1]["slug"], "open-source");
        assert_eq!(mixins[0].value[1]["count"], 2);
    }
}
