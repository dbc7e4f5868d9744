//! Sidecar metadata parsing.
//!
//! A sidecar is a block of `key: value` lines. Each recognized key has a
//! handler in [`FIELD_HANDLERS`]; every handler runs on every parse, with the
//! value when the key was present and `None` when it was not, so every field
//! ends up at either its parsed value or its default.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use miniblog_render::{RenderError, TemplateEnv};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

pub const DEFAULT_TITLE: &str = "unknown title";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Malformed date: {value:?}")]
    MalformedDate { value: String },

    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Invalid template {name}: {source}")]
    InvalidTemplate {
        name: String,
        #[source]
        source: RenderError,
    },
}

/// Parsed metadata of one content item
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub date: Option<NaiveDateTime>,
    pub template: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub slug: String,
    pub path: Option<String>,
    pub is_static: bool,
}

/// Everything a field handler may consult besides its own value
pub struct FieldContext<'a> {
    pub source_path: &'a Path,
    pub templates: &'a TemplateEnv,
    pub default_template: &'a str,
    pub keep_empty_tags: bool,
}

type FieldHandler = fn(&mut Metadata, Option<&str>, &FieldContext<'_>) -> Result<(), MetadataError>;

/// Recognized sidecar keys and their handlers, in processing order
pub static FIELD_HANDLERS: &[(&str, FieldHandler)] = &[
    ("title", process_title),
    ("date", process_date),
    ("template", process_template),
    ("tags", process_tags),
    ("category", process_category),
    ("slug", process_slug),
    ("path", process_path),
    ("static", process_static),
];

/// Split sidecar text into lowercased keys and trimmed values.
///
/// Lines without a colon are skipped; a repeated key keeps its last value.
pub fn parse_fields(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
        .collect()
}

/// Parse sidecar text into a [`Metadata`] record.
///
/// All handlers run even when an earlier one fails; the first failure in
/// table order is returned.
pub fn parse_metadata(text: &str, ctx: &FieldContext<'_>) -> Result<Metadata, MetadataError> {
    let fields = parse_fields(text);
    let mut metadata = Metadata::default();
    let mut first_error = None;

    for (name, handler) in FIELD_HANDLERS {
        let value = fields.get(*name).map(String::as_str);
        if let Err(err) = handler(&mut metadata, value, ctx) {
            tracing::debug!("Field {} of {:?} failed: {}", name, ctx.source_path, err);
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(metadata),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn process_title(
    meta: &mut Metadata,
    value: Option<&str>,
    _: &FieldContext<'_>,
) -> Result<(), MetadataError> {
    meta.title = non_empty(value).unwrap_or(DEFAULT_TITLE).to_string();
    Ok(())
}

fn process_date(
    meta: &mut Metadata,
    value: Option<&str>,
    _: &FieldContext<'_>,
) -> Result<(), MetadataError> {
    meta.date = match non_empty(value) {
        None => None,
        Some(raw) => Some(parse_datetime(raw).ok_or_else(|| MetadataError::MalformedDate {
            value: raw.to_string(),
        })?),
    };
    Ok(())
}

fn process_template(
    meta: &mut Metadata,
    value: Option<&str>,
    ctx: &FieldContext<'_>,
) -> Result<(), MetadataError> {
    let name = non_empty(value).unwrap_or(ctx.default_template);
    meta.template = ctx.templates.resolve(name).map_err(|err| match err {
        RenderError::TemplateNotFound(name) => MetadataError::TemplateNotFound { name },
        source => MetadataError::InvalidTemplate {
            name: name.to_string(),
            source,
        },
    })?;
    Ok(())
}

fn process_tags(
    meta: &mut Metadata,
    value: Option<&str>,
    ctx: &FieldContext<'_>,
) -> Result<(), MetadataError> {
    meta.tags = match value {
        None => Vec::new(),
        Some(raw) => split_tags(raw, ctx.keep_empty_tags),
    };
    Ok(())
}

fn process_category(
    meta: &mut Metadata,
    value: Option<&str>,
    _: &FieldContext<'_>,
) -> Result<(), MetadataError> {
    meta.category = non_empty(value).map(str::to_string);
    Ok(())
}

fn process_slug(
    meta: &mut Metadata,
    value: Option<&str>,
    ctx: &FieldContext<'_>,
) -> Result<(), MetadataError> {
    meta.slug = match non_empty(value) {
        Some(slug) => slug.to_string(),
        None => ctx
            .source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    Ok(())
}

fn process_path(
    meta: &mut Metadata,
    value: Option<&str>,
    _: &FieldContext<'_>,
) -> Result<(), MetadataError> {
    meta.path = non_empty(value).map(str::to_string);
    Ok(())
}

fn process_static(
    meta: &mut Metadata,
    value: Option<&str>,
    _: &FieldContext<'_>,
) -> Result<(), MetadataError> {
    meta.is_static = value
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "yes" | "1" | "on"))
        .unwrap_or(false);
    Ok(())
}

static TAG_SEPARATOR: OnceLock<Regex> = OnceLock::new();

fn tag_separator() -> &'static Regex {
    TAG_SEPARATOR.get_or_init(|| Regex::new(r"[ ,;]").unwrap())
}

/// Split a tag list on spaces, commas and semicolons
pub fn split_tags(raw: &str, keep_empty: bool) -> Vec<String> {
    tag_separator()
        .split(raw)
        .filter(|tag| keep_empty || !tag.is_empty())
        .map(str::to_string)
        .collect()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse a date or date/time string in any of the common notations.
///
/// Offsets are normalized to UTC. Returns `None` when nothing matches.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
