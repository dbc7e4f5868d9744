//! Runtime template environment.
//!
//! Templates are resolved by name: first from the site's templates directory,
//! then from the built-in sources compiled into this crate. Templates whose
//! name ends in `.html` are auto-escaped.

use minijinja::{path_loader, Environment, ErrorKind, Value};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Failed to render template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Built-in template sources, used when the templates directory has no file
/// of the same name.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("default.html", include_str!("../builtin/default.html")),
    ("category.html", include_str!("../builtin/category.html")),
    ("categories.html", include_str!("../builtin/categories.html")),
];

fn builtin_source(name: &str) -> Option<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, source)| *source)
}

/// Template lookup and rendering shared by every namespace of a site.
pub struct TemplateEnv {
    env: Environment<'static>,
}

impl TemplateEnv {
    /// Create an environment reading from `templates_dir` (if any) with the
    /// built-in templates as fallback.
    pub fn new(templates_dir: Option<&Path>) -> Self {
        let mut env = Environment::new();
        let dir_loader = templates_dir.map(path_loader);

        env.set_loader(move |name| {
            if let Some(loader) = &dir_loader {
                if let Some(source) = loader(name)? {
                    return Ok(Some(source));
                }
            }
            Ok(builtin_source(name).map(str::to_string))
        });

        Self { env }
    }

    /// Resolve a template identifier, failing if no source exists for it.
    pub fn resolve(&self, name: &str) -> Result<String, RenderError> {
        match self.env.get_template(name) {
            Ok(template) => Ok(template.name().to_string()),
            Err(err) if err.kind() == ErrorKind::TemplateNotFound => {
                Err(RenderError::TemplateNotFound(name.to_string()))
            }
            Err(source) => Err(RenderError::Template {
                name: name.to_string(),
                source,
            }),
        }
    }

    /// Install a value visible to every subsequent render call.
    pub fn add_global<T: Serialize>(&mut self, name: &str, value: &T) {
        tracing::debug!("Installing template global {}", name);
        self.env
            .add_global(name.to_string(), Value::from_serialize(value));
    }

    /// Render template `name` with `ctx` layered over the globals.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, RenderError> {
        let template = self.env.get_template(name).map_err(|err| {
            if err.kind() == ErrorKind::TemplateNotFound {
                RenderError::TemplateNotFound(name.to_string())
            } else {
                RenderError::Template {
                    name: name.to_string(),
                    source: err,
                }
            }
        })?;

        template.render(ctx).map_err(|source| RenderError::Template {
            name: name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_templates_resolve_without_directory() {
        let env = TemplateEnv::new(None);
        for (name, _) in BUILTIN_TEMPLATES {
            assert_eq!(env.resolve(name).unwrap(), *name);
        }
    }

    #[test]
    fn test_unknown_template_is_not_found() {
        let env = TemplateEnv::new(None);
        match env.resolve("missing.html") {
            Err(RenderError::TemplateNotFound(name)) => assert_eq!(name, "missing.html"),
            other => panic!("expected TemplateNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_directory_overrides_builtin() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("default.html"), "custom {{ content }}").unwrap();

        let env = TemplateEnv::new(Some(dir.path()));
        let html = env
            .render("default.html", context! { content => "body" })
            .unwrap();
        assert_eq!(html, "custom body");
    }

    #[test]
    fn test_html_templates_escape_by_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("page.html"), "{{ title }}|{{ body|safe }}").unwrap();

        let env = TemplateEnv::new(Some(dir.path()));
        let html = env
            .render("page.html", context! { title => "<b>", body => "<p>ok</p>" })
            .unwrap();
        assert_eq!(html, "&lt;b&gt;|<p>ok</p>");
    }

    #[test]
    fn test_globals_are_visible() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("g.txt"), "{{ site.title }}").unwrap();

        let mut env = TemplateEnv::new(Some(dir.path()));
        env.add_global("site", &serde_json::json!({ "title": "Blog" }));
        assert_eq!(env.render("g.txt", context! {}).unwrap(), "Blog");
    }
}
