//! Math shielding.
//!
//! Markdown parsers treat `_`, `*` and `\` inside TeX as emphasis and
//! escapes. Before parsing, every `$$…$$` and `$…$` span is swapped for an
//! opaque placeholder; after parsing the placeholders are swapped back.
//!
//! Placeholders look like `%%%MATH<nonce>BLOCK<i>%%%`. The nonce is the
//! smallest number for which `%%%MATH<nonce>` does not already occur in the
//! input, so user text can never contain a live placeholder.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::error;

use crate::error::{MarkframeError, MarkframeResult};

/// Reserved placeholder prefix.
pub const MARKER_PREFIX: &str = "%%%MATH";

const MARKER_SUFFIX: &str = "%%%";

fn block_math() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Lazy so `$$a$$ $$b$$` yields two spans; may span lines.
    RE.get_or_init(|| Regex::new(r"(?s)\$\$.*?\$\$").expect("valid block math regex"))
}

fn inline_math() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // At least one character, no `$` and no newline inside, so a dangling
    // `$` cannot swallow the rest of the document.
    RE.get_or_init(|| Regex::new(r"\$[^$\n]+?\$").expect("valid inline math regex"))
}

/// Which syntax a shielded span used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathKind {
    Block,
    Inline,
}

impl MathKind {
    fn tag(&self) -> &'static str {
        match self {
            MathKind::Block => "BLOCK",
            MathKind::Inline => "INLINE",
        }
    }
}

/// One captured math span, delimiters included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldedSpan {
    pub kind: MathKind,
    pub source: String,
}

/// Ordered captures of a single shield pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShieldTable {
    nonce: u64,
    spans: Vec<ShieldedSpan>,
}

impl ShieldTable {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ShieldedSpan> {
        self.spans.get(index)
    }

    pub fn spans(&self) -> &[ShieldedSpan] {
        &self.spans
    }

    /// Placeholder text for entry `index`.
    pub fn token(&self, index: usize) -> Option<String> {
        let span = self.spans.get(index)?;
        Some(format_token(self.nonce, span.kind, index))
    }

    fn push(&mut self, kind: MathKind, source: &str) -> String {
        let index = self.spans.len();
        self.spans.push(ShieldedSpan {
            kind,
            source: source.to_string(),
        });
        format_token(self.nonce, kind, index)
    }
}

/// Output of [`shield`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shielded {
    pub text: String,
    pub table: ShieldTable,
}

fn format_token(nonce: u64, kind: MathKind, index: usize) -> String {
    format!("{MARKER_PREFIX}{nonce}{}{index}{MARKER_SUFFIX}", kind.tag())
}

fn choose_nonce(text: &str) -> u64 {
    (0u64..)
        .find(|nonce| !text.contains(&format!("{MARKER_PREFIX}{nonce}")))
        .unwrap_or_default()
}

/// Replace math spans with placeholders, block syntax first.
pub fn shield(text: &str) -> Shielded {
    let mut table = ShieldTable {
        nonce: choose_nonce(text),
        spans: Vec::new(),
    };

    let blocks_done = block_math()
        .replace_all(text, |caps: &Captures| table.push(MathKind::Block, &caps[0]))
        .into_owned();
    // An inline span may straddle a block placeholder; record it with the
    // block text put back so every entry is an original substring.
    let blocks = table.spans.clone();
    let nonce = table.nonce;
    let protected = inline_math()
        .replace_all(&blocks_done, |caps: &Captures| {
            let source = expand_blocks(&caps[0], nonce, &blocks);
            table.push(MathKind::Inline, &source)
        })
        .into_owned();

    Shielded {
        text: protected,
        table,
    }
}

fn expand_blocks(capture: &str, nonce: u64, blocks: &[ShieldedSpan]) -> String {
    if !capture.contains(MARKER_PREFIX) {
        return capture.to_string();
    }
    blocks
        .iter()
        .enumerate()
        .fold(capture.to_string(), |acc, (index, span)| {
            acc.replace(&format_token(nonce, MathKind::Block, index), &span.source)
        })
}

/// Restore every placeholder of `table` found in `html`.
///
/// Restored spans are escaped as HTML text so the mounted text content is the
/// original source byte-for-byte.
pub fn unshield(html: &str, table: &ShieldTable) -> MarkframeResult<String> {
    if table.is_empty() {
        return Ok(html.to_string());
    }

    let pattern = format!(
        r"{}{}(?:BLOCK|INLINE)(\d+){}",
        regex::escape(MARKER_PREFIX),
        table.nonce,
        regex::escape(MARKER_SUFFIX)
    );
    let token = Regex::new(&pattern).map_err(|e| MarkframeError::Config(e.to_string()))?;

    let mut missing = None;
    let restored = token.replace_all(html, |caps: &Captures| {
        let span = caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|index| table.get(index));
        match span {
            Some(span) => escape_text(&span.source),
            None => {
                missing.get_or_insert_with(|| caps[1].parse::<usize>().unwrap_or(usize::MAX));
                caps[0].to_string()
            }
        }
    });

    if let Some(index) = missing {
        error!(index, "placeholder without shield table entry");
        return Err(MarkframeError::ShieldMismatch { index });
    }
    Ok(restored.into_owned())
}

fn escape_text(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for c in source.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
