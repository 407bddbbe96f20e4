//! MarkFrame Core Library
//!
//! Markdown with LaTeX math and fenced code, rendered onto a frosted glass
//! card and captured as a PNG.
//!
//! ## Overview
//!
//! - **Shielding**: math spans are swapped for placeholders before Markdown
//!   parsing so `_`, `*` and `\` inside TeX survive
//! - **Post-processing**: math typesetting and code highlighting run as
//!   idempotent passes over an explicit node tree
//! - **Capture**: the card is rasterized at a pixel ratio (3 for files, 2 for
//!   the clipboard) with its blur and tint layers reproduced
//! - **Capabilities**: every external provider is loaded lazily and tracked
//!   in a [`CapabilityRegistry`]; nothing assumes it is ready
//!
//! ## Quick Start
//!
//! ```ignore
//! use markframe_core::{CapabilityRegistry, CaptureEngine, CaptureTarget, RenderPipeline, StyleConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = std::sync::Arc::new(CapabilityRegistry::new());
//!     for handle in registry.request_defaults() {
//!         handle.await?;
//!     }
//!
//!     let pipeline = RenderPipeline::new(registry.clone());
//!     pipeline.render_now("# Hello $x^2$")?;
//!
//!     let style = StyleConfig::default();
//!     let node = markframe_core::CaptureNode::new(800, 600, markframe_core::compose(&style), pipeline.html());
//!     CaptureEngine::new(registry).capture(&node, CaptureTarget::File).await?;
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod capture;
pub mod dataurl;
pub mod dom;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod markdown;
pub mod pipeline;
pub mod postprocess;
pub mod scheduler;
pub mod shield;
pub mod style;
pub mod upload;

/// Markdown shown when the editor opens.
pub const DEFAULT_DOCUMENT: &str = r#"# The Glass Effect

> "Simplicity is the ultimate sophistication."

Notice how the **background colors** blur beautifully behind this card.

$$ E = mc^2 $$

### Python Code
```python
def glass_morph():
    return "Crystal Clear"
```
"#;

// Re-exports
pub use capability::{CapabilityEvent, CapabilityKind, CapabilityRegistry, CapabilityStatus};
pub use capture::{
    export_filename, fit_content, CaptureEngine, CaptureNode, CaptureOutcome, CaptureTarget, Clock, ExportJob,
    FixedClock, FontLibrary, GlassRasterizer, Rasterizer, SystemClock, MAX_CAPTURE_SIDE,
};
pub use dom::{Element, Fragment, Node, Rendered};
pub use error::{MarkframeError, MarkframeResult};
pub use geometry::{
    CanvasGeometry, CanvasResize, ListenerAction, PointerEvent, ResizeGesture, SidebarGeometry, SidebarResize,
};
pub use markdown::{render_markdown, MarkdownParser, MarkdownRenderer, PulldownParser, RenderOutcome};
pub use pipeline::RenderPipeline;
pub use postprocess::{PassReport, PostProcessor};
pub use scheduler::{TaskHandle, TaskScheduler};
pub use shield::{shield, unshield, ShieldTable, Shielded};
pub use style::{compose, Background, CompositedStyle, Rgb, StyleConfig, ThemeMode};
