//! Markdown to HTML rendering with math shielding.

use pulldown_cmark::{html, Event, Options, Parser};
use tracing::debug;

use crate::error::MarkframeResult;
use crate::shield::{shield, unshield};

/// A Markdown parsing capability.
pub trait MarkdownParser: Send + Sync {
    /// Parse Markdown into an HTML string.
    fn parse(&self, text: &str) -> String;
}

/// pulldown-cmark with GitHub-flavored extensions.
#[derive(Debug, Clone, Copy)]
pub struct PulldownParser {
    /// Turn single newlines inside a paragraph into `<br />`
    pub breaks: bool,
}

impl Default for PulldownParser {
    fn default() -> Self {
        Self { breaks: true }
    }
}

impl PulldownParser {
    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_GFM);
        options
    }
}

impl MarkdownParser for PulldownParser {
    fn parse(&self, text: &str) -> String {
        let breaks = self.breaks;
        let parser = Parser::new_ext(text, Self::options()).map(|event| match event {
            Event::SoftBreak if breaks => Event::HardBreak,
            other => other,
        });
        let mut html_output = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}

/// Shield math, parse, restore math.
pub fn render_markdown(text: &str, parser: &dyn MarkdownParser) -> MarkframeResult<String> {
    let shielded = shield(text);
    let html = parser.parse(&shielded.text);
    unshield(&html, &shielded.table)
}

/// What a call to [`MarkdownRenderer::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// New HTML was produced
    Rendered,
    /// Same document and parser already ready; nothing to do
    Unchanged,
    /// Parser not ready; previous HTML kept
    Deferred,
}

/// Keeps the last rendered HTML and decides when to re-render.
///
/// Re-renders on a document change or when the parser becomes ready. While
/// the parser is missing the previous HTML stays in place.
#[derive(Debug, Default)]
pub struct MarkdownRenderer {
    html: String,
    source: Option<String>,
    parser_ready: bool,
    renders: u64,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered HTML (empty before the first render).
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Number of completed renders.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn update(
        &mut self,
        document: &str,
        parser: Option<&dyn MarkdownParser>,
    ) -> MarkframeResult<RenderOutcome> {
        let Some(parser) = parser else {
            self.parser_ready = false;
            debug!("markdown parser not ready, keeping previous html");
            return Ok(RenderOutcome::Deferred);
        };

        if self.parser_ready && self.source.as_deref() == Some(document) {
            return Ok(RenderOutcome::Unchanged);
        }

        let html = render_markdown(document, parser)?;
        self.html = html;
        self.source = Some(document.to_string());
        self.parser_ready = true;
        self.renders += 1;
        debug!(renders = self.renders, bytes = self.html.len(), "markdown rendered");
        Ok(RenderOutcome::Rendered)
    }
}
