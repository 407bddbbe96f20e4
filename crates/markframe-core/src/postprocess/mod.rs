//! Post-processing of mounted content.
//!
//! ```text
//!   mounted Fragment
//!         │
//!         ├── math pass       (needs MathTypesetter + AutoRender)
//!         │
//!         └── highlight pass  (needs Highlighter)
//! ```
//!
//! Each pass runs only when its capabilities are ready; a missing one is a
//! silent skip. Both passes are idempotent over their own output.

pub mod highlight;
pub mod math;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::capability::{CapabilityKind, CapabilityRegistry};
use crate::dom::Fragment;
use crate::style::ThemeMode;

pub use highlight::{highlight_blocks, Highlighter, SyntectHighlighter};
pub use math::{typeset_math, AutoRender, MathMlTypesetter, MathTypesetter};

/// Delay between a content commit and the post-processing pass.
pub const POST_PROCESS_DELAY: Duration = Duration::from_millis(50);

/// Scheduler key of the post-processing pass.
pub const POST_PROCESS_TASK: &str = "post-process";

/// What one run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub math_ran: bool,
    pub highlight_ran: bool,
    pub spans_typeset: usize,
    pub spans_failed: usize,
    pub blocks_highlighted: usize,
}

/// Snapshot of the ready enhancement capabilities.
#[derive(Clone, Default)]
pub struct PostProcessor {
    math: Option<(Arc<dyn MathTypesetter>, Arc<AutoRender>)>,
    highlighter: Option<Arc<dyn Highlighter>>,
    theme: ThemeMode,
}

impl std::fmt::Debug for PostProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostProcessor")
            .field("math", &self.math.is_some())
            .field("highlighter", &self.highlighter.is_some())
            .field("theme", &self.theme)
            .finish()
    }
}

impl PostProcessor {
    pub fn new(theme: ThemeMode) -> Self {
        Self {
            theme,
            ..Default::default()
        }
    }

    /// Take whatever is ready in `registry` right now.
    pub fn from_registry(registry: &CapabilityRegistry, theme: ThemeMode) -> Self {
        let typesetter = registry.provider::<Arc<dyn MathTypesetter>>(CapabilityKind::MathTypesetter);
        let auto = registry.provider::<Arc<AutoRender>>(CapabilityKind::MathAutoRender);
        Self {
            math: typesetter.zip(auto),
            highlighter: registry.provider::<Arc<dyn Highlighter>>(CapabilityKind::Highlighter),
            theme,
        }
    }

    pub fn with_math(mut self, typesetter: Arc<dyn MathTypesetter>, auto: Arc<AutoRender>) -> Self {
        self.math = Some((typesetter, auto));
        self
    }

    pub fn with_highlighter(mut self, highlighter: Arc<dyn Highlighter>) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    /// Run the ready passes over `fragment`.
    pub fn run(&self, fragment: &mut Fragment) -> PassReport {
        let mut report = PassReport::default();

        if let Some((typesetter, auto)) = &self.math {
            let stats = typeset_math(fragment, auto, typesetter.as_ref());
            report.math_ran = true;
            report.spans_typeset = stats.typeset;
            report.spans_failed = stats.failed;
        }

        if let Some(highlighter) = &self.highlighter {
            report.blocks_highlighted = highlight_blocks(fragment, highlighter.as_ref(), self.theme);
            report.highlight_ran = true;
        }

        debug!(?report, "post-processing pass done");
        report
    }
}
