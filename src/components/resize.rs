//! Resize Handles
//!
//! Pointer-down on a handle starts a gesture in the core state machine.
//! While a gesture is active, `DragOverlay` covers the whole window and
//! receives every move and up event, standing in for window-level listeners.

use dioxus::prelude::*;
use markframe_core::geometry::GestureOutput;
use markframe_core::{ListenerAction, PointerEvent};

use crate::context::{use_editor_state, DragTarget, EditorState};

fn listener_action<G>(output: Option<GestureOutput<G>>) -> Option<ListenerAction> {
    match output? {
        GestureOutput::Listeners(action) => Some(action),
        GestureOutput::Geometry(_) => None,
    }
}

/// Feed one pointer event to the gesture owned by `target`.
fn dispatch(mut state: EditorState, target: DragTarget, event: PointerEvent) {
    let action = match target {
        DragTarget::Canvas => listener_action(state.canvas.write().handle(event)),
        DragTarget::Sidebar => listener_action(state.sidebar.write().handle(event)),
    };

    match action {
        Some(ListenerAction::Attach) => state.dragging.set(Some(target)),
        Some(ListenerAction::Detach) => state.dragging.set(None),
        None => {}
    }
}

/// Corner handle that grows the canvas symmetrically
#[component]
pub fn CanvasHandle() -> Element {
    let state = use_editor_state();

    // Hidden while a capture runs
    if (state.busy)() {
        return rsx! {};
    }

    rsx! {
        div {
            class: "resize-handle resize-handle--canvas",
            title: "Drag to resize",
            onmousedown: move |e: MouseEvent| {
                e.stop_propagation();
                let point = e.client_coordinates();
                dispatch(state, DragTarget::Canvas, PointerEvent::down(point.x, point.y));
            },
        }
    }
}

/// Right-edge handle of the sidebar
#[component]
pub fn SidebarHandle() -> Element {
    let state = use_editor_state();

    rsx! {
        div {
            class: "resize-handle resize-handle--sidebar",
            onmousedown: move |e: MouseEvent| {
                e.stop_propagation();
                let point = e.client_coordinates();
                dispatch(state, DragTarget::Sidebar, PointerEvent::down(point.x, point.y));
            },
        }
    }
}

/// Full-window event catcher, mounted only while dragging
#[component]
pub fn DragOverlay() -> Element {
    let state = use_editor_state();
    let Some(target) = (state.dragging)() else {
        return rsx! {};
    };

    let cursor = match target {
        DragTarget::Canvas => "nwse-resize",
        DragTarget::Sidebar => "ew-resize",
    };

    rsx! {
        div {
            class: "drag-overlay",
            style: "cursor: {cursor}",
            onmousemove: move |e: MouseEvent| {
                let point = e.client_coordinates();
                dispatch(state, target, PointerEvent::moved(point.x, point.y));
            },
            onmouseup: move |e: MouseEvent| {
                let point = e.client_coordinates();
                dispatch(state, target, PointerEvent::up(point.x, point.y));
            },
            onmouseleave: move |e: MouseEvent| {
                let point = e.client_coordinates();
                dispatch(state, target, PointerEvent::up(point.x, point.y));
            },
        }
    }
}
