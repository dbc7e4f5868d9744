//! Askama template definitions.

use askama::Template;

/// 404 error page template
///
/// Deliberately carries no request detail: the page must not leak paths.
#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub site_title: String,
    pub home_url: String,
}

impl NotFoundTemplate {
    pub fn new(site_title: impl Into<String>, home_url: impl Into<String>) -> Self {
        Self {
            site_title: site_title.into(),
            home_url: home_url.into(),
        }
    }
}
