//! The site namespace: an ordered list of providers behind one URL surface.

use crate::categories::CategoryNamespace;
use crate::config::{Config, DuplicateUrlPolicy};
use crate::item::ItemError;
use crate::items::{ItemNamespace, NamespaceError};
use crate::namespace::{Namespace, RenderContext};
use miniblog_render::{RenderError, TemplateEnv};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("URL emitted by more than one provider: {0}")]
    DuplicateOutput(String),

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl SiteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SiteError::NotFound(_))
    }
}

/// Every page of a site, resolved through providers in a fixed order.
///
/// [`SiteNamespace::load`] consults the category namespace before the item
/// namespace, so a category page wins over an item claiming the same URL.
pub struct SiteNamespace {
    providers: Vec<Arc<dyn Namespace>>,
    ctx: RenderContext,
    duplicate_urls: DuplicateUrlPolicy,
    items: Option<Arc<ItemNamespace>>,
    categories: Option<Arc<CategoryNamespace>>,
}

impl SiteNamespace {
    /// Discover the content tree described by `config` with filesystem reads
    pub fn load(config: &Config) -> Result<Self, NamespaceError> {
        let templates = TemplateEnv::new(Some(config.templates_dir().as_path()));
        Self::load_with(config, RenderContext::new(templates))
    }

    /// Like [`SiteNamespace::load`] with caller-supplied collaborators
    pub fn load_with(config: &Config, ctx: RenderContext) -> Result<Self, NamespaceError> {
        let content_dir = config.content_dir();
        tracing::info!("Loading content from {:?}", content_dir);

        let items = Arc::new(ItemNamespace::populate(&content_dir, &ctx, &config.content)?);
        let categories = Arc::new(CategoryNamespace::new(items.clone()));

        let providers: Vec<Arc<dyn Namespace>> = vec![categories.clone(), items.clone()];
        let mut site = Self::from_providers(providers, ctx, config.build.duplicate_urls);
        site.ctx.templates.add_global(
            "site",
            &json!({ "title": config.site.title, "base_url": config.site.base_url }),
        );
        site.items = Some(items);
        site.categories = Some(categories);
        Ok(site)
    }

    /// Compose `providers` in the given priority order.
    ///
    /// Mixins of every provider are installed as template globals now; they
    /// are snapshots and do not follow later changes.
    pub fn from_providers(
        providers: Vec<Arc<dyn Namespace>>,
        mut ctx: RenderContext,
        duplicate_urls: DuplicateUrlPolicy,
    ) -> Self {
        for provider in &providers {
            for mixin in provider.mixins() {
                tracing::debug!("Provider {} contributes {}", provider.name(), mixin.name);
                ctx.templates.add_global(mixin.name, &mixin.value);
            }
        }

        Self {
            providers,
            ctx,
            duplicate_urls,
            items: None,
            categories: None,
        }
    }

    pub fn items(&self) -> Option<&ItemNamespace> {
        self.items.as_deref()
    }

    pub fn categories(&self) -> Option<&CategoryNamespace> {
        self.categories.as_deref()
    }

    /// Resolve `url`; the first provider with an answer wins
    pub fn dispatch(&self, url: &str) -> Result<String, SiteError> {
        for provider in &self.providers {
            if let Some(html) = provider.dispatch(url, &self.ctx)? {
                return Ok(html);
            }
        }
        Err(SiteError::NotFound(url.to_string()))
    }

    /// Every URL of every provider, in provider order
    pub fn urls(&self) -> Vec<String> {
        self.providers.iter().flat_map(|p| p.urls()).collect()
    }

    /// Every page as `(url, html)`, rendered as the iterator advances.
    ///
    /// Each call starts a fresh walk over provider state. Repeated URLs are
    /// handled by the configured [`DuplicateUrlPolicy`].
    pub fn get_all(&self) -> impl Iterator<Item = Result<(String, String), SiteError>> + '_ {
        let mut seen = HashSet::new();
        let policy = self.duplicate_urls;

        self.providers
            .iter()
            .flat_map(|provider| provider.urls().into_iter().map(move |url| (provider, url)))
            .filter_map(move |(provider, url)| {
                if !seen.insert(url.clone()) {
                    match policy {
                        DuplicateUrlPolicy::Keep => {}
                        DuplicateUrlPolicy::First => {
                            tracing::warn!(
                                "Skipping duplicate URL {} from {}",
                                url,
                                provider.name()
                            );
                            return None;
                        }
                        DuplicateUrlPolicy::Error => {
                            return Some(Err(SiteError::DuplicateOutput(url)));
                        }
                    }
                }

                let page = match provider.dispatch(&url, &self.ctx) {
                    Ok(Some(html)) => Ok((url, html)),
                    Ok(None) => Err(SiteError::NotFound(url)),
                    Err(err) => Err(err),
                };
                Some(page)
            })
    }
}
