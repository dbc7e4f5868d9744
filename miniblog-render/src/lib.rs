//! # miniblog-render
//!
//! Template rendering library for miniblog.
//!
//! Content pages are rendered with minijinja templates looked up by name at
//! runtime ([`TemplateEnv`]); the fixed pages the server needs on its own
//! (the 404 page) are compiled in with Askama.

pub mod env;
pub mod templates;

pub use env::{RenderError, TemplateEnv, BUILTIN_TEMPLATES};
pub use templates::NotFoundTemplate;
