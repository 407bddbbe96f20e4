//! Code block highlighting pass.

use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::{trace, warn};

use crate::dom::{Element, Fragment, Node, Rendered};
use crate::style::ThemeMode;

/// Marker attribute set on highlighted blocks.
pub const HIGHLIGHTED_ATTR: &str = "data-highlighted";

const LIGHT_THEME: &str = "InspiredGitHub";
const DARK_THEME: &str = "base16-ocean.dark";

/// A syntax highlighting capability.
pub trait Highlighter: Send + Sync {
    /// Highlight `code` into markup. `language` is the fence info string.
    fn highlight(&self, code: &str, language: Option<&str>, theme: ThemeMode) -> Result<String, String>;
}

/// syntect with its bundled syntaxes and themes, emitting inline styles.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    themes: ThemeSet,
}

impl std::fmt::Debug for SyntectHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntectHighlighter")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .field("themes", &self.themes.themes.len())
            .finish()
    }
}

impl SyntectHighlighter {
    /// Load the bundled definitions. Takes tens of milliseconds.
    pub fn load() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            themes: ThemeSet::load_defaults(),
        }
    }

    fn theme_name(theme: ThemeMode) -> &'static str {
        match theme {
            ThemeMode::Light => LIGHT_THEME,
            ThemeMode::Dark => DARK_THEME,
        }
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: Option<&str>, theme: ThemeMode) -> Result<String, String> {
        let syntax = language
            .and_then(|lang| self.syntaxes.find_syntax_by_token(lang))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());
        let theme = self
            .themes
            .themes
            .get(Self::theme_name(theme))
            .ok_or_else(|| format!("theme {} missing", Self::theme_name(theme)))?;

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut out = String::with_capacity(code.len() * 2);
        for line in LinesWithEndings::from(code) {
            let regions = highlighter
                .highlight_line(line, &self.syntaxes)
                .map_err(|e| e.to_string())?;
            let html = styled_line_to_highlighted_html(&regions[..], IncludeBackground::No)
                .map_err(|e| e.to_string())?;
            out.push_str(&html);
        }
        Ok(out)
    }
}

/// Language named by a `language-*` class, if any.
pub fn code_language(code: &Element) -> Option<&str> {
    code.classes().find_map(|c| c.strip_prefix("language-"))
}

/// Highlight every `pre > code` block in `fragment`.
///
/// The marker attribute is cleared first so already highlighted blocks are
/// redone with the current source and theme. Returns the number of blocks
/// highlighted; a block that fails keeps its plain text.
pub fn highlight_blocks(fragment: &mut Fragment, highlighter: &dyn Highlighter, theme: ThemeMode) -> usize {
    let mut count = 0;
    fragment.for_each_element_mut(&mut |el| {
        if el.name != "pre" {
            return;
        }
        for child in &mut el.children {
            if let Node::Element(code) = child {
                if code.name == "code" && highlight_code(code, highlighter, theme) {
                    count += 1;
                }
            }
        }
    });
    count
}

fn highlight_code(code: &mut Element, highlighter: &dyn Highlighter, theme: ThemeMode) -> bool {
    code.remove_attr(HIGHLIGHTED_ATTR);
    let source = code.text_content();
    let language = code_language(code).map(str::to_string);

    match highlighter.highlight(&source, language.as_deref(), theme) {
        Ok(markup) => {
            trace!(language = ?language, bytes = source.len(), "code block highlighted");
            code.children = vec![Node::Rendered(Rendered { markup, source })];
            code.add_class("hljs");
            code.set_attr(HIGHLIGHTED_ATTR, "yes");
            true
        }
        Err(reason) => {
            warn!(language = ?language, %reason, "code block left unhighlighted");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Highlighter for Upper {
        fn highlight(&self, code: &str, language: Option<&str>, theme: ThemeMode) -> Result<String, String> {
            Ok(format!(
                "<b data-lang=\"{}\" data-theme=\"{:?}\">{}</b>",
                language.unwrap_or("none"),
                theme,
                code.to_uppercase()
            ))
        }
    }

    #[test]
    fn test_blocks_get_marked() {
        let mut fragment =
            Fragment::parse("<pre><code class=\"language-python\">x = 1\n</code></pre>");
        let count = highlight_blocks(&mut fragment, &Upper, ThemeMode::Light);
        assert_eq!(count, 1);
        let html = fragment.to_html();
        assert!(html.contains("class=\"language-python hljs\""));
        assert!(html.contains("data-highlighted=\"yes\""));
        assert!(html.contains("data-lang=\"python\""));
        assert!(html.contains("X = 1"));
        // Text content is still the plain source
        assert_eq!(fragment.text_content(), "x = 1\n");
    }

    #[test]
    fn test_inline_code_untouched() {
        let mut fragment = Fragment::parse("<p><code>inline</code></p>");
        assert_eq!(highlight_blocks(&mut fragment, &Upper, ThemeMode::Light), 0);
        assert_eq!(fragment.to_html(), "<p><code>inline</code></p>");
    }

    #[test]
    fn test_rehighlight_uses_new_theme() {
        let mut fragment = Fragment::parse("<pre><code>a</code></pre>");
        highlight_blocks(&mut fragment, &Upper, ThemeMode::Light);
        highlight_blocks(&mut fragment, &Upper, ThemeMode::Dark);
        let html = fragment.to_html();
        assert!(html.contains("data-theme=\"Dark\""));
        assert_eq!(html.matches("data-highlighted").count(), 1);
        assert_eq!(fragment.text_content(), "a");
    }

    #[test]
    fn test_syntect_emits_styled_spans() {
        let highlighter = SyntectHighlighter::load();
        let html = highlighter
            .highlight("def f():\n    return 1\n", Some("python"), ThemeMode::Light)
            .unwrap();
        assert!(html.contains("<span style=\""));
        assert!(html.contains("return"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain() {
        let highlighter = SyntectHighlighter::load();
        let html = highlighter
            .highlight("<tag>", Some("no-such-lang"), ThemeMode::Dark)
            .unwrap();
        assert!(html.contains("&lt;tag&gt;"));
    }
}
