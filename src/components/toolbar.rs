//! Export Toolbar
//!
//! Export and copy buttons plus capability status chips.

use dioxus::prelude::*;
use markframe_core::{CapabilityStatus, CaptureOutcome, CaptureTarget, MarkframeError};
use rfd::{MessageButtons, MessageDialog, MessageLevel};

use crate::context::{use_editor_state, use_studio};

/// Blocking alert for a failed user action.
async fn alert(message: &'static str) {
    let shown = tokio::task::spawn_blocking(move || {
        MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title("MarkFrame")
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show()
    })
    .await;
    if let Err(e) = shown {
        tracing::error!("Failed to show alert: {:?}", e);
    }
}

async fn report_failure(target: CaptureTarget, error: MarkframeError) {
    tracing::error!("{:?} capture failed: {}", target, error);
    if let Some(message) = error.user_message() {
        alert(message).await;
    }
}

#[component]
pub fn Toolbar() -> Element {
    let studio = use_studio();
    let state = use_editor_state();
    let mut notice = use_signal(|| Option::<String>::None);

    let busy = (state.busy)();
    let rasterizer_ready = studio.registry.is_ready(markframe_core::CapabilityKind::Rasterizer);

    let export_studio = studio.clone();
    let export = move |_| {
        let studio = export_studio.clone();
        spawn(async move {
            let node = state.capture_node(&studio.pipeline).await;
            match studio.capture.capture(&node, CaptureTarget::File).await {
                Ok(CaptureOutcome::Saved { path, .. }) => {
                    notice.set(Some(format!("Saved to {}", path.display())));
                }
                Ok(_) => {}
                Err(e) => report_failure(CaptureTarget::File, e).await,
            }
        });
    };

    let copy_studio = studio.clone();
    let copy = move |_| {
        let studio = copy_studio.clone();
        spawn(async move {
            let node = state.capture_node(&studio.pipeline).await;
            match studio.capture.capture(&node, CaptureTarget::Clipboard).await {
                Ok(CaptureOutcome::Copied { .. }) => notice.set(Some("Copied to clipboard".to_string())),
                Ok(_) => {}
                Err(e) => report_failure(CaptureTarget::Clipboard, e).await,
            }
        });
    };

    let capabilities = state.capabilities.read().clone();

    rsx! {
        header { class: "toolbar",
            div { class: "toolbar__status",
                for (kind, status) in capabilities {
                    span {
                        key: "{kind}",
                        class: match status {
                            CapabilityStatus::Ready => "chip chip--ready",
                            CapabilityStatus::Error(_) => "chip chip--error",
                            CapabilityStatus::Loading => "chip chip--loading",
                            CapabilityStatus::Idle => "chip",
                        },
                        title: "{status}",
                        "{kind}"
                    }
                }
            }

            if let Some(text) = notice() {
                span { class: "toolbar__notice", "{text}" }
            }

            div { class: "toolbar__actions",
                button {
                    class: "btn btn--secondary",
                    disabled: busy || !rasterizer_ready,
                    onclick: copy,
                    if busy { "Working..." } else { "Copy" }
                }
                button {
                    class: "btn btn--primary",
                    disabled: busy || !rasterizer_ready,
                    onclick: export,
                    if busy { "Working..." } else { "Export PNG" }
                }
            }
        }
    }
}
