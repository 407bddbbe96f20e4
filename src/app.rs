use dioxus::prelude::*;
use tokio::sync::broadcast::error::RecvError;

use crate::components::{DragOverlay, Editor, Preview, SidebarHandle, StylePanel, Toolbar};
use crate::context::{get_download_dir, EditorState, Studio};
use crate::theme::GLOBAL_STYLES;

/// Root application component.
///
/// Provides global styles, the core services and the editor signals, and
/// keeps the render pipeline in step with them.
#[component]
pub fn App() -> Element {
    let studio = use_context_provider(|| Studio::new(get_download_dir()));
    let mut state = use_context_provider(|| EditorState::new(crate::get_initial_document()));

    // Load capabilities and forward their status changes to the pipeline
    let registry_studio = studio.clone();
    use_future(move || {
        let studio = registry_studio.clone();
        async move {
            let mut events = studio.registry.subscribe_events();
            studio.registry.request_defaults();
            loop {
                match events.recv().await {
                    Ok(event) => {
                        state.set_capability(event.kind, event.status.clone());
                        let document = state.document.peek().clone();
                        if let Err(e) = studio.pipeline.on_capability(&event, &document) {
                            tracing::error!("Failed to apply {} status: {}", event.kind, e);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Missed {} capability events", missed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    });

    // Mirror pipeline revisions into the html signal
    let revision_studio = studio.clone();
    use_future(move || {
        let pipeline = revision_studio.pipeline.clone();
        async move {
            let mut revisions = pipeline.subscribe();
            while revisions.changed().await.is_ok() {
                state.html.set(pipeline.html());
            }
        }
    });

    // Mirror the capture busy flag
    let busy_studio = studio.clone();
    use_future(move || {
        let capture = busy_studio.capture.clone();
        async move {
            let mut busy = capture.subscribe_busy();
            while busy.changed().await.is_ok() {
                let value = *busy.borrow_and_update();
                state.busy.set(value);
            }
        }
    });

    // Re-render on every document change
    let render_studio = studio.clone();
    use_effect(move || {
        let document = state.document.read().clone();
        if let Err(e) = render_studio.pipeline.update(&document) {
            tracing::error!("Render failed: {}", e);
        }
    });

    // Re-highlight when the theme flips
    let theme_studio = studio.clone();
    use_effect(move || {
        let theme = state.style.read().theme;
        theme_studio.pipeline.set_theme(theme);
    });

    let sidebar_width = state.sidebar.read().current().width;

    rsx! {
        style { {GLOBAL_STYLES} }
        div { class: "app-shell",
            aside {
                class: "sidebar",
                style: "width: {sidebar_width}px",
                div { class: "sidebar__brand",
                    span { class: "sidebar__logo", "MarkFrame" }
                }
                div { class: "sidebar__scroll",
                    Editor {}
                    StylePanel {}
                }
                SidebarHandle {}
            }
            main { class: "workspace",
                Toolbar {}
                Preview {}
            }
            DragOverlay {}
        }
    }
}
