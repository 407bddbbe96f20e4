//! Markdown Editor
//!
//! Source textarea with a snippet toolbar. The preview updates live.

use dioxus::prelude::*;

use crate::context::use_editor_state;

/// Append `snippet` on a fresh line, or as the whole text when empty.
fn append_block(current: &str, snippet: &str) -> String {
    if current.is_empty() {
        snippet.to_string()
    } else if current.ends_with('\n') {
        format!("{}\n{}", current, snippet)
    } else {
        format!("{}\n\n{}", current, snippet)
    }
}

/// Markdown source editor
///
/// Features:
/// - Toolbar with formatting, math and code snippets
/// - Every keystroke replaces the document
#[component]
pub fn Editor(
    /// Placeholder text
    #[props(default = "Write Markdown, $math$ and ```code```...".to_string())]
    placeholder: String,
) -> Element {
    let state = use_editor_state();
    let mut document = state.document;

    let insert_bold = move |_: MouseEvent| {
        let current = document.read().clone();
        document.set(format!("{}**bold text**", current));
    };

    let insert_heading = move |_: MouseEvent| {
        let current = document.read().clone();
        document.set(append_block(&current, "## Heading\n"));
    };

    let insert_inline_math = move |_: MouseEvent| {
        let current = document.read().clone();
        document.set(format!("{}$a^2 + b^2 = c^2$", current));
    };

    let insert_block_math = move |_: MouseEvent| {
        let current = document.read().clone();
        document.set(append_block(&current, "$$\n\\int_0^1 x \\, dx\n$$\n"));
    };

    let insert_code = move |_: MouseEvent| {
        let current = document.read().clone();
        document.set(append_block(&current, "```rust\nfn main() {}\n```\n"));
    };

    let insert_quote = move |_: MouseEvent| {
        let current = document.read().clone();
        document.set(append_block(&current, "> Quote\n"));
    };

    let chars = document.read().chars().count();

    rsx! {
        section { class: "panel editor",
            div { class: "panel__header",
                span { class: "panel__title", "Content" }
                span { class: "panel__meta", "{chars} chars" }
            }

            div { class: "md-toolbar",
                button { class: "md-btn", onclick: insert_bold, title: "Bold", "B" }
                button { class: "md-btn", onclick: insert_heading, title: "Heading", "H" }
                button { class: "md-btn", onclick: insert_quote, title: "Quote", "\u{201c}" }
                button { class: "md-btn", onclick: insert_inline_math, title: "Inline math", "$x$" }
                button { class: "md-btn", onclick: insert_block_math, title: "Display math", "$$" }
                button { class: "md-btn", onclick: insert_code, title: "Code block", "</>" }
            }

            textarea {
                class: "md-textarea",
                value: "{document}",
                oninput: move |e| document.set(e.value()),
                placeholder: "{placeholder}",
                spellcheck: false,
            }
        }
    }
}
