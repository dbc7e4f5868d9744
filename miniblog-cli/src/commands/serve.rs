//! Dev server: resolves every request against an in-memory site namespace.

use super::build::load_config;
use anyhow::{Context, Result};
use askama::Template;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Router,
};
use miniblog_core::{Config, SiteNamespace};
use miniblog_render::NotFoundTemplate;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    site: Arc<RwLock<Arc<SiteNamespace>>>,
    site_title: String,
    home_url: String,
}

impl AppState {
    fn new(site: SiteNamespace, config: &Config) -> Self {
        Self {
            site: Arc::new(RwLock::new(Arc::new(site))),
            site_title: config.site.title.clone(),
            home_url: config.site.base_url.clone(),
        }
    }
}

fn load_site(config: &Config) -> Result<SiteNamespace> {
    SiteNamespace::load(config).context("Failed to load site")
}

/// Serve the site with live rebuilds until interrupted
pub async fn serve(config_path: &Path, port: Option<u16>) -> Result<()> {
    let config = load_config(config_path)?;
    let port = port.unwrap_or(config.server.port);

    let state = AppState::new(load_site(&config)?, &config);
    let _watcher = spawn_rebuilder(state.clone(), config.clone())?;

    let app = router(state, &config).layer(TraceLayer::new_for_http());

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Starting dev server on http://localhost:{}", port);
    println!("\nServing {} at http://localhost:{}", config.site.title, port);
    println!("   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn router(state: AppState, config: &Config) -> Router {
    let mut app = Router::new();
    if let Some(mount) = media_mount(&config.media_prefix()) {
        app = app.nest_service(&mount, ServeDir::new(config.media_dir()));
    }
    app.fallback(serve_page).with_state(state)
}

/// Where media is mounted: the prefix without its trailing slash, or
/// nothing when the prefix is the site root.
fn media_mount(prefix: &str) -> Option<String> {
    let mount = prefix.trim_end_matches('/');
    if mount.is_empty() {
        None
    } else {
        Some(mount.to_string())
    }
}

/// Watch content and templates; every change rebuilds the whole site.
///
/// The returned watcher must stay alive for events to keep flowing.
fn spawn_rebuilder(state: AppState, config: Config) -> Result<RecommendedWatcher> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize file watcher")?;

    for dir in [config.content_dir(), config.templates_dir()] {
        if !dir.is_dir() {
            tracing::debug!("Not watching missing directory {:?}", dir);
            continue;
        }
        watcher
            .watch(&dir, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {:?}", dir))?;
    }

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                Ok(_ev) => {
                    // Debounce a bit by draining pending events
                    while rx.try_recv().is_ok() {}
                    tracing::info!("Change detected, rebuilding site...");
                    rebuild(&state, &config).await;
                }
                Err(err) => tracing::warn!("Watcher error: {}", err),
            }
        }
    });

    Ok(watcher)
}

/// Load a fresh site and swap it in. On failure the current site keeps
/// serving. Returns whether the swap happened.
async fn rebuild(state: &AppState, config: &Config) -> bool {
    let res = tokio::task::spawn_blocking({
        let config = config.clone();
        move || load_site(&config)
    })
    .await;

    match res {
        Ok(Ok(site)) => {
            *state.site.write().await = Arc::new(site);
            tracing::info!("Rebuild complete");
            true
        }
        Ok(Err(e)) => {
            tracing::error!("Rebuild failed: {:?}", e);
            false
        }
        Err(e) => {
            tracing::error!("Rebuild task panicked: {}", e);
            false
        }
    }
}

/// Resolve one request path through the site namespace
async fn serve_page(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    if !path.ends_with('/') {
        let target = match uri.query() {
            Some(query) => format!("{}/?{}", path, query),
            None => format!("{}/", path),
        };
        return Redirect::temporary(&target).into_response();
    }

    // Pages are registered under decoded URLs (%20 -> space)
    let url = match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            tracing::debug!("Undecodable request path {}: {}", path, err);
            return not_found(&state);
        }
    };

    let site = state.site.read().await.clone();
    match tokio::task::spawn_blocking(move || site.dispatch(&url)).await {
        Ok(Ok(html)) => Html(html).into_response(),
        Ok(Err(err)) if err.is_not_found() => not_found(&state),
        Ok(Err(err)) => {
            tracing::error!("Failed to render {}: {}", path, err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
        Err(err) => {
            tracing::error!("Render task for {} panicked: {}", path, err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn not_found(state: &AppState) -> Response {
    let page = NotFoundTemplate::new(state.site_title.as_str(), state.home_url.as_str());
    match page.render() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(err) => {
            tracing::error!("Failed to render 404 page: {}", err);
            (StatusCode::NOT_FOUND, "404 Not Found").into_response()
        }
    }
}
