//! Shared state for MarkFrame components.
//!
//! Two contexts are provided by `App`:
//!
//! - [`Studio`]: the core services (capability registry, render pipeline,
//!   capture engine). Cloning is cheap; clones share state.
//! - [`EditorState`]: reactive signals for everything the chrome edits.
//!
//! ## Usage
//!
//! ```ignore
//! let studio = use_studio();
//! let state = use_editor_state();
//!
//! state.document.set("# Hello".to_string());
//! let html = studio.pipeline.html();
//! ```

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use dioxus::prelude::*;
use markframe_core::capture::DirectoryDownloads;
use markframe_core::{
    compose, CapabilityKind, CapabilityRegistry, CapabilityStatus, CanvasResize, CaptureEngine, CaptureNode,
    RenderPipeline, SidebarResize, StyleConfig,
};

/// Core services behind the UI.
#[derive(Clone)]
pub struct Studio {
    pub registry: Arc<CapabilityRegistry>,
    pub pipeline: RenderPipeline,
    pub capture: CaptureEngine,
}

impl Studio {
    pub fn new(download_dir: PathBuf) -> Self {
        let registry = Arc::new(CapabilityRegistry::new());
        let pipeline = RenderPipeline::new(Arc::clone(&registry));
        let capture = CaptureEngine::new(Arc::clone(&registry))
            .with_downloads(Arc::new(DirectoryDownloads::new(download_dir)));
        Self {
            registry,
            pipeline,
            capture,
        }
    }
}

/// Which resize gesture currently owns the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Canvas,
    Sidebar,
}

/// Reactive editor state. Every field is a signal, so this is `Copy`.
#[derive(Clone, Copy)]
pub struct EditorState {
    /// Raw Markdown source
    pub document: Signal<String>,
    pub style: Signal<StyleConfig>,
    pub canvas: Signal<CanvasResize>,
    pub sidebar: Signal<SidebarResize>,
    /// Set while a gesture has window-level listeners attached
    pub dragging: Signal<Option<DragTarget>>,
    /// Latest post-processed content HTML
    pub html: Signal<String>,
    /// Mirrors the capture busy flag
    pub busy: Signal<bool>,
    pub capabilities: Signal<Vec<(CapabilityKind, CapabilityStatus)>>,
    /// The mounted preview frame, measured at capture time
    pub frame: Signal<Option<Rc<MountedData>>>,
}

impl EditorState {
    pub fn new(document: String) -> Self {
        Self {
            document: Signal::new(document),
            style: Signal::new(StyleConfig::default()),
            canvas: Signal::new(CanvasResize::default()),
            sidebar: Signal::new(SidebarResize::default()),
            dragging: Signal::new(None),
            html: Signal::new(String::new()),
            busy: Signal::new(false),
            capabilities: Signal::new(
                CapabilityKind::ALL
                    .iter()
                    .map(|kind| (*kind, CapabilityStatus::Idle))
                    .collect(),
            ),
            frame: Signal::new(None),
        }
    }

    /// Snapshot of what the preview shows, for capture.
    ///
    /// The frame grows past the canvas when content overflows, so the height
    /// is taken from the mounted frame when it can be measured.
    pub async fn capture_node(&self, pipeline: &RenderPipeline) -> CaptureNode {
        let (width, height) = self.canvas.peek().current().pixel_size();
        let node = CaptureNode::new(width, height, compose(&self.style.peek()), pipeline.html());

        let frame = self.frame.peek().clone();
        let measured = match frame {
            Some(frame) => frame.get_client_rect().await.ok().map(|rect| rect.size.height),
            None => None,
        };
        node.with_min_height(displayed_height(height, measured))
    }

    /// Record a capability status change.
    pub fn set_capability(&mut self, kind: CapabilityKind, status: CapabilityStatus) {
        let mut capabilities = self.capabilities.write();
        match capabilities.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = status,
            None => capabilities.push((kind, status)),
        }
    }
}

/// Height of the displayed frame, never below the canvas height.
fn displayed_height(canvas: u32, measured: Option<f64>) -> u32 {
    match measured {
        Some(height) if height.is_finite() && height > 0.0 => canvas.max(height.ceil().min(u32::MAX as f64) as u32),
        _ => canvas,
    }
}

/// Download directory for the application.
/// Uses the global download dir set from command line args.
pub fn get_download_dir() -> PathBuf {
    crate::get_download_dir()
}

/// Hook to access the core services from context.
pub fn use_studio() -> Studio {
    use_context::<Studio>()
}

/// Hook to access the editor signals from context.
pub fn use_editor_state() -> EditorState {
    use_context::<EditorState>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displayed_height_follows_overflowing_frame() {
        assert_eq!(displayed_height(600, Some(912.4)), 913);
        assert_eq!(displayed_height(600, Some(600.0)), 600);
    }

    #[test]
    fn test_displayed_height_keeps_canvas_floor() {
        assert_eq!(displayed_height(600, Some(320.0)), 600);
        assert_eq!(displayed_height(600, None), 600);
        assert_eq!(displayed_height(600, Some(f64::NAN)), 600);
        assert_eq!(displayed_height(600, Some(-5.0)), 600);
    }
}
