//! Resize gestures for the canvas and the sidebar.
//!
//! ```text
//!            pointer_down / Attach
//!   ┌──────┐ ─────────────────────▶ ┌──────────┐
//!   │ Idle │                        │ Dragging │ ◀─┐ pointer_move / geometry
//!   └──────┘ ◀───────────────────── └──────────┘ ──┘
//!            pointer_up / Detach
//! ```
//!
//! The host feeds pointer events in; entry and exit actions tell it when to
//! attach and detach window-level listeners. Geometry is derived from the
//! delta against the baseline captured at pointer-down.

use serde::{Deserialize, Serialize};

pub const MIN_CANVAS_WIDTH: f64 = 300.0;
pub const MIN_CANVAS_HEIGHT: f64 = 200.0;
pub const MIN_SIDEBAR_WIDTH: f64 = 250.0;
pub const MAX_SIDEBAR_WIDTH: f64 = 800.0;
pub const DEFAULT_SIDEBAR_WIDTH: f64 = 384.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl CanvasGeometry {
    /// Geometry with the minimums applied.
    pub fn clamped(width: f64, height: f64) -> Self {
        Self {
            width: width.max(MIN_CANVAS_WIDTH),
            height: height.max(MIN_CANVAS_HEIGHT),
        }
    }

    /// Integer pixel size, rounded.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.round() as u32, self.height.round() as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidebarGeometry {
    pub width: f64,
}

impl Default for SidebarGeometry {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIDEBAR_WIDTH,
        }
    }
}

/// How a pointer delta maps onto a geometry.
pub trait ResizePolicy {
    type Geometry: Copy + PartialEq + std::fmt::Debug;

    fn resize(&self, baseline: Self::Geometry, dx: f64, dy: f64) -> Self::Geometry;
}

/// The canvas is centered, so it grows on both sides: twice the delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenteredCanvas;

impl ResizePolicy for CenteredCanvas {
    type Geometry = CanvasGeometry;

    fn resize(&self, baseline: CanvasGeometry, dx: f64, dy: f64) -> CanvasGeometry {
        CanvasGeometry::clamped(baseline.width + 2.0 * dx, baseline.height + 2.0 * dy)
    }
}

/// The sidebar is anchored on one edge; its width follows the pointer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeSidebar;

impl ResizePolicy for EdgeSidebar {
    type Geometry = SidebarGeometry;

    fn resize(&self, baseline: SidebarGeometry, dx: f64, _dy: f64) -> SidebarGeometry {
        let width = baseline.width + dx;
        if !width.is_finite() {
            return baseline;
        }
        SidebarGeometry {
            width: width.clamp(MIN_SIDEBAR_WIDTH, MAX_SIDEBAR_WIDTH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// A pointer event in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Down,
            x,
            y,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Move,
            x,
            y,
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Up,
            x,
            y,
        }
    }
}

/// Listener management requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    Attach,
    Detach,
}

/// Result of feeding one event to [`ResizeGesture::handle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutput<G> {
    Listeners(ListenerAction),
    Geometry(G),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState<G> {
    Idle,
    Dragging { start: (f64, f64), baseline: G },
}

/// One resize handle's state machine.
#[derive(Debug, Clone)]
pub struct ResizeGesture<P: ResizePolicy> {
    policy: P,
    current: P::Geometry,
    state: GestureState<P::Geometry>,
}

pub type CanvasResize = ResizeGesture<CenteredCanvas>;
pub type SidebarResize = ResizeGesture<EdgeSidebar>;

impl Default for CanvasResize {
    fn default() -> Self {
        Self::new(CenteredCanvas, CanvasGeometry::default())
    }
}

impl Default for SidebarResize {
    fn default() -> Self {
        Self::new(EdgeSidebar, SidebarGeometry::default())
    }
}

impl<P: ResizePolicy> ResizeGesture<P> {
    pub fn new(policy: P, initial: P::Geometry) -> Self {
        Self {
            policy,
            current: initial,
            state: GestureState::Idle,
        }
    }

    pub fn current(&self) -> P::Geometry {
        self.current
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Overwrite the geometry outside of a drag.
    pub fn set(&mut self, geometry: P::Geometry) {
        self.current = geometry;
    }

    /// Start a drag. Ignored while already dragging.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<ListenerAction> {
        if self.is_dragging() {
            return None;
        }
        self.state = GestureState::Dragging {
            start: (x, y),
            baseline: self.current,
        };
        Some(ListenerAction::Attach)
    }

    /// Update geometry from the pointer. Ignored while idle.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<P::Geometry> {
        let GestureState::Dragging { start, baseline } = self.state else {
            return None;
        };
        self.current = self.policy.resize(baseline, x - start.0, y - start.1);
        Some(self.current)
    }

    /// End a drag. Ignored while idle.
    pub fn pointer_up(&mut self) -> Option<ListenerAction> {
        if !self.is_dragging() {
            return None;
        }
        self.state = GestureState::Idle;
        Some(ListenerAction::Detach)
    }

    pub fn handle(&mut self, event: PointerEvent) -> Option<GestureOutput<P::Geometry>> {
        match event.kind {
            PointerKind::Down => self.pointer_down(event.x, event.y).map(GestureOutput::Listeners),
            PointerKind::Move => self.pointer_move(event.x, event.y).map(GestureOutput::Geometry),
            PointerKind::Up => self.pointer_up().map(GestureOutput::Listeners),
        }
    }
}
