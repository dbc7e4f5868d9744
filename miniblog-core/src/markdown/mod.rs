//! Markup to HTML conversion.

use pulldown_cmark::{html, Event, Options, Parser};

/// Converts raw content text to HTML.
///
/// Implementations must neutralize raw HTML in the input; the result is
/// inserted into templates unescaped.
pub trait MarkupConverter: Send + Sync {
    fn to_html(&self, text: &str) -> String;
}

/// Markdown processor backed by pulldown-cmark
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }

    /// Convert markdown to HTML, escaping any raw HTML in the source
    pub fn convert(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let events = escape_raw_html(parser);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events);
        html_output
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupConverter for MarkdownProcessor {
    fn to_html(&self, text: &str) -> String {
        self.convert(text)
    }
}

/// Turn raw HTML events into text so the renderer escapes them.
fn escape_raw_html<'a>(
    events: impl Iterator<Item = Event<'a>>,
) -> impl Iterator<Item = Event<'a>> {
    events.map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    })
}
