//! UI Components for MarkFrame.
//!
//! Sidebar controls on the left, the glass card preview on the right.

mod editor;
mod preview;
mod resize;
mod style_panel;
mod toolbar;

pub use editor::Editor;
pub use preview::Preview;
pub use resize::{CanvasHandle, DragOverlay, SidebarHandle};
pub use style_panel::StylePanel;
pub use toolbar::Toolbar;
