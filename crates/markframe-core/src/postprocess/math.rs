//! Math typesetting pass.

use tracing::warn;

use crate::dom::{Element, Fragment, Node, Rendered};
use crate::error::MarkframeError;

/// A TeX typesetting capability.
pub trait MathTypesetter: Send + Sync {
    /// Typeset `tex` (delimiters stripped) into markup.
    fn typeset(&self, tex: &str, display: bool) -> Result<String, String>;
}

/// latex2mathml backend producing MathML.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathMlTypesetter;

impl MathTypesetter for MathMlTypesetter {
    fn typeset(&self, tex: &str, display: bool) -> Result<String, String> {
        let style = if display {
            latex2mathml::DisplayStyle::Block
        } else {
            latex2mathml::DisplayStyle::Inline
        };
        latex2mathml::latex_to_mathml(tex.trim(), style).map_err(|e| e.to_string())
    }
}

/// A left/right delimiter pair recognized in rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub left: &'static str,
    pub right: &'static str,
    pub display: bool,
}

/// Recognized delimiters, in priority order.
pub const DEFAULT_DELIMITERS: [Delimiter; 4] = [
    Delimiter {
        left: "$$",
        right: "$$",
        display: true,
    },
    Delimiter {
        left: "$",
        right: "$",
        display: false,
    },
    Delimiter {
        left: "\\(",
        right: "\\)",
        display: false,
    },
    Delimiter {
        left: "\\[",
        right: "\\]",
        display: true,
    },
];

/// Text of elements with these names is never scanned.
pub const IGNORED_TAGS: &[&str] = &["script", "noscript", "style", "textarea", "pre", "code", "option"];

/// A piece of a scanned text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Math {
        /// Span including delimiters
        raw: &'a str,
        /// Span without delimiters
        tex: &'a str,
        display: bool,
    },
}

/// Finds math spans in text nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoRender {
    delimiters: Vec<Delimiter>,
}

impl Default for AutoRender {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.to_vec(),
        }
    }
}

impl AutoRender {
    pub fn with_delimiters(delimiters: Vec<Delimiter>) -> Self {
        Self { delimiters }
    }

    pub fn ignores(&self, element: &Element) -> bool {
        IGNORED_TAGS.contains(&element.name.as_str()) || element.has_class("math")
    }

    /// Split `text` into plain and math segments.
    ///
    /// A left delimiter without a matching right one ends the scan; the rest
    /// of the text stays plain.
    pub fn split<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let bytes = text.as_bytes();
        let mut segments = Vec::new();
        let mut plain_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            let Some(delim) = self
                .delimiters
                .iter()
                .find(|d| bytes[i..].starts_with(d.left.as_bytes()))
            else {
                i += 1;
                continue;
            };

            let content_start = i + delim.left.len();
            let Some(end) = find_end_of_math(bytes, content_start, delim.right.as_bytes()) else {
                break;
            };

            if plain_start < i {
                segments.push(Segment::Text(&text[plain_start..i]));
            }
            let span_end = end + delim.right.len();
            segments.push(Segment::Math {
                raw: &text[i..span_end],
                tex: &text[content_start..end],
                display: delim.display,
            });
            plain_start = span_end;
            i = span_end;
        }

        if plain_start < text.len() {
            segments.push(Segment::Text(&text[plain_start..]));
        }
        segments
    }
}

/// Index of the closing delimiter, skipping escaped characters and anything
/// inside unbalanced braces.
fn find_end_of_math(bytes: &[u8], start: usize, right: &[u8]) -> Option<usize> {
    let mut depth: i32 = 0;
    let mut i = start;
    while i < bytes.len() {
        let c = bytes[i];
        if depth <= 0 && bytes[i..].starts_with(right) {
            return Some(i);
        }
        match c {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Counts from one math pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MathStats {
    pub typeset: usize,
    pub failed: usize,
}

/// Replace math spans in `fragment` with typeset nodes.
///
/// A span that fails to typeset keeps its original text.
pub fn typeset_math(
    fragment: &mut Fragment,
    auto: &AutoRender,
    typesetter: &dyn MathTypesetter,
) -> MathStats {
    let mut stats = MathStats::default();
    rewrite(&mut fragment.children, auto, typesetter, &mut stats);
    stats
}

fn rewrite(
    nodes: &mut Vec<Node>,
    auto: &AutoRender,
    typesetter: &dyn MathTypesetter,
    stats: &mut MathStats,
) {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            Node::Text(text) => {
                let segments = auto.split(&text);
                if !segments.iter().any(|s| matches!(s, Segment::Math { .. })) {
                    out.push(Node::Text(text));
                    continue;
                }
                for segment in segments {
                    out.push(render_segment(segment, typesetter, stats));
                }
            }
            Node::Element(mut el) => {
                if !auto.ignores(&el) {
                    rewrite(&mut el.children, auto, typesetter, stats);
                }
                out.push(Node::Element(el));
            }
            rendered @ Node::Rendered(_) => out.push(rendered),
        }
    }
    *nodes = out;
}

fn render_segment(segment: Segment<'_>, typesetter: &dyn MathTypesetter, stats: &mut MathStats) -> Node {
    let (raw, tex, display) = match segment {
        Segment::Text(text) => return Node::text(text),
        Segment::Math { raw, tex, display } => (raw, tex, display),
    };

    match typesetter.typeset(tex, display) {
        Ok(markup) => {
            stats.typeset += 1;
            let class = if display { "math math-display" } else { "math math-inline" };
            Node::Element(Element::new("span").with_attr("class", class).with_child(
                Node::Rendered(Rendered {
                    markup,
                    source: raw.to_string(),
                }),
            ))
        }
        Err(reason) => {
            stats.failed += 1;
            let err = MarkframeError::MathTypeset {
                tex: tex.to_string(),
                reason,
            };
            warn!(%err, "math span left as text");
            Node::text(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wraps the TeX in a marker element; fails on `\bad`.
    struct EchoTypesetter;

    impl MathTypesetter for EchoTypesetter {
        fn typeset(&self, tex: &str, display: bool) -> Result<String, String> {
            if tex.contains("\\bad") {
                return Err("undefined control sequence".into());
            }
            Ok(format!("<m d=\"{}\">{}</m>", display, tex))
        }
    }

    fn split(text: &str) -> Vec<Segment<'_>> {
        AutoRender::default().split(text)
    }

    #[test]
    fn test_split_prefers_double_dollar() {
        let segments = split("a $$x$$ b");
        assert_eq!(
            segments,
            vec![
                Segment::Text("a "),
                Segment::Math {
                    raw: "$$x$$",
                    tex: "x",
                    display: true
                },
                Segment::Text(" b"),
            ]
        );
    }

    #[test]
    fn test_split_all_four_forms() {
        let segments = split("$a$ \\(b\\) \\[c\\] $$d$$");
        let maths: Vec<_> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Math { tex, display, .. } => Some((*tex, *display)),
                _ => None,
            })
            .collect();
        assert_eq!(maths, vec![("a", false), ("b", false), ("c", true), ("d", true)]);
    }

    #[test]
    fn test_split_respects_braces_and_escapes() {
        let segments = split("$\\text{a $ b}$ and $\\$5$");
        let maths: Vec<_> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Math { tex, .. } => Some(*tex),
                _ => None,
            })
            .collect();
        assert_eq!(maths, vec!["\\text{a $ b}", "\\$5"]);
    }

    #[test]
    fn test_unclosed_delimiter_stops_scan() {
        let segments = split("price $5 and more");
        assert_eq!(segments, vec![Segment::Text("price $5 and more")]);
    }

    #[test]
    fn test_non_ascii_text() {
        let segments = split("héllo $π$ wörld");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2], Segment::Text(" wörld"));
    }

    #[test]
    fn test_typeset_replaces_spans() {
        let mut fragment = Fragment::parse("<p>Inline $x$ and</p><p>$$y$$</p>");
        let stats = typeset_math(&mut fragment, &AutoRender::default(), &EchoTypesetter);
        assert_eq!(stats, MathStats { typeset: 2, failed: 0 });
        let html = fragment.to_html();
        assert!(html.contains("<span class=\"math math-inline\"><m d=\"false\">x</m></span>"));
        assert!(html.contains("<span class=\"math math-display\"><m d=\"true\">y</m></span>"));
        // Text content still reads as the original source
        assert_eq!(fragment.text_content(), "Inline $x$ and$$y$$");
    }

    #[test]
    fn test_failed_span_keeps_text() {
        let mut fragment = Fragment::parse("<p>$\\bad$ then $ok$</p>");
        let stats = typeset_math(&mut fragment, &AutoRender::default(), &EchoTypesetter);
        assert_eq!(stats, MathStats { typeset: 1, failed: 1 });
        let html = fragment.to_html();
        assert!(html.contains("$\\bad$ then "));
        assert!(html.contains("<m d=\"false\">ok</m>"));
    }

    #[test]
    fn test_code_is_ignored() {
        let mut fragment = Fragment::parse("<pre><code>$x$</code></pre><p><code>$y$</code></p>");
        let stats = typeset_math(&mut fragment, &AutoRender::default(), &EchoTypesetter);
        assert_eq!(stats.typeset, 0);
    }

    #[test]
    fn test_second_pass_is_noop() {
        let mut fragment = Fragment::parse("<p>$x$ and $$y$$</p>");
        typeset_math(&mut fragment, &AutoRender::default(), &EchoTypesetter);
        let once = fragment.to_html();
        let stats = typeset_math(&mut fragment, &AutoRender::default(), &EchoTypesetter);
        assert_eq!(stats.typeset, 0);
        assert_eq!(fragment.to_html(), once);
    }

    #[test]
    fn test_mathml_backend() {
        let markup = MathMlTypesetter.typeset("x^2", false).unwrap();
        assert!(markup.contains("<math"));
        assert!(markup.contains("<msup>"));
    }
}
