//! Edge case and boundary condition tests
//!
//! Unusual documents, malformed inputs and out-of-range values.

use std::sync::Arc;

use markframe_core::dataurl::decode_data_url;
use markframe_core::geometry::{MIN_CANVAS_HEIGHT, MIN_CANVAS_WIDTH};
use markframe_core::shield::MARKER_PREFIX;
use markframe_core::upload::{image_data_url, read_image_data_url};
use markframe_core::{
    shield, unshield, Background, CanvasGeometry, CanvasResize, CapabilityKind, CapabilityRegistry, MarkdownParser,
    MarkdownRenderer, MarkframeError, PointerEvent, PulldownParser, RenderOutcome, RenderPipeline, StyleConfig,
};

fn pipeline_with_parser() -> RenderPipeline {
    let registry = Arc::new(CapabilityRegistry::new());
    registry.install(
        CapabilityKind::MarkdownParser,
        Arc::new(PulldownParser::default()) as Arc<dyn MarkdownParser>,
    );
    RenderPipeline::new(registry)
}

// ============================================================================
// Empty Input Tests
// ============================================================================

#[test]
fn test_empty_document() {
    let pipeline = pipeline_with_parser();
    let (outcome, report) = pipeline.render_now("").unwrap();
    assert_eq!(outcome, RenderOutcome::Rendered);
    assert_eq!(pipeline.html(), "");
    assert_eq!(report.spans_typeset, 0);
}

#[test]
fn test_whitespace_only_document() {
    let pipeline = pipeline_with_parser();
    for doc in ["   ", "\n\n", "\t"] {
        pipeline.render_now(doc).unwrap();
        assert!(pipeline.text_content().trim().is_empty());
    }
}

#[test]
fn test_shield_without_math_is_identity() {
    let shielded = shield("no math here, only *text*");
    assert!(shielded.table.is_empty());
    assert_eq!(shielded.text, "no math here, only *text*");
}

// ============================================================================
// Delimiter Edge Cases
// ============================================================================

#[test]
fn test_unmatched_dollar_is_plain_text() {
    let shielded = shield("costs $5 and more");
    assert!(shielded.table.is_empty());
    assert_eq!(shielded.text, "costs $5 and more");
}

#[test]
fn test_inline_math_does_not_cross_lines() {
    let shielded = shield("$a\nb$");
    assert!(shielded.table.is_empty());
}

#[test]
fn test_block_math_spans_lines() {
    let input = "$$\na + b\n$$";
    let shielded = shield(input);
    assert_eq!(shielded.table.len(), 1);
    assert_eq!(shielded.table.get(0).unwrap().source, input);
}

#[test]
fn test_empty_dollar_pairs_are_not_math() {
    let shielded = shield("$$$$");
    assert!(shielded.table.is_empty());
}

#[test]
fn test_math_with_html_characters_is_escaped() {
    let shielded = shield("$a < b & c > d$");
    let restored = unshield(&shielded.text, &shielded.table).unwrap();
    assert_eq!(restored, "$a &lt; b &amp; c &gt; d$");
}

// ============================================================================
// Placeholder Collisions
// ============================================================================

#[test]
fn test_literal_marker_in_document_survives() {
    let input = format!("{}0BLOCK0%%% and $x$", MARKER_PREFIX);
    let shielded = shield(&input);
    assert_ne!(shielded.table.nonce(), 0);

    let parser = PulldownParser::default();
    let mut renderer = MarkdownRenderer::new();
    renderer.update(&input, Some(&parser)).unwrap();
    assert!(renderer.html().contains("%%%MATH0BLOCK0%%%"));
    assert!(renderer.html().contains("$x$"));
}

#[test]
fn test_unknown_placeholder_is_mismatch() {
    let shielded = shield("$x$");
    let forged = shielded.table.token(0).unwrap().replace("INLINE0", "INLINE7");
    let err = unshield(&forged, &shielded.table).unwrap_err();
    assert!(matches!(err, MarkframeError::ShieldMismatch { index: 7 }));
}

// ============================================================================
// Parser Readiness
// ============================================================================

#[test]
fn test_deferred_render_keeps_previous_html() {
    let parser = PulldownParser::default();
    let mut renderer = MarkdownRenderer::new();
    renderer.update("# First", Some(&parser)).unwrap();

    assert_eq!(renderer.update("# Second", None).unwrap(), RenderOutcome::Deferred);
    assert!(renderer.html().contains("First"));

    // Parser back: same document re-renders because readiness changed
    assert_eq!(renderer.update("# Second", Some(&parser)).unwrap(), RenderOutcome::Rendered);
    assert!(renderer.html().contains("Second"));
}

#[test]
fn test_pipeline_without_any_capability() {
    let pipeline = RenderPipeline::new(Arc::new(CapabilityRegistry::new()));
    let (outcome, report) = pipeline.render_now("# Hello $x$").unwrap();
    assert_eq!(outcome, RenderOutcome::Deferred);
    assert!(!report.math_ran);
    assert!(!report.highlight_ran);
    assert_eq!(pipeline.html(), "");
}

// ============================================================================
// Geometry Boundaries
// ============================================================================

#[test]
fn test_canvas_shrinks_to_minimum() {
    let mut gesture = CanvasResize::default();
    gesture.handle(PointerEvent::down(500.0, 500.0));
    gesture.handle(PointerEvent::moved(-10_000.0, -10_000.0));
    let geometry = gesture.current();
    assert_eq!(geometry.width, MIN_CANVAS_WIDTH);
    assert_eq!(geometry.height, MIN_CANVAS_HEIGHT);
}

#[test]
fn test_move_without_down_is_ignored() {
    let mut gesture = CanvasResize::default();
    assert_eq!(gesture.handle(PointerEvent::moved(900.0, 900.0)), None);
    assert_eq!(gesture.current(), CanvasGeometry::default());
}

#[test]
fn test_clamped_rejects_non_finite() {
    let geometry = CanvasGeometry::clamped(f64::NAN, f64::NEG_INFINITY);
    assert_eq!(geometry.width, MIN_CANVAS_WIDTH);
    assert_eq!(geometry.height, MIN_CANVAS_HEIGHT);
}

// ============================================================================
// Style Boundaries
// ============================================================================

#[test]
fn test_style_json_out_of_range_is_clamped() {
    let style = StyleConfig::from_json(r#"{"blur": 500, "opacity": 250, "padding": 2, "radius": 99}"#).unwrap();
    assert_eq!(style.blur, 60);
    assert_eq!(style.opacity, 100);
    assert_eq!(style.padding, 16);
    assert_eq!(style.radius, 48);
}

#[test]
fn test_style_json_invalid_is_config_error() {
    let err = StyleConfig::from_json("{not json").unwrap_err();
    assert!(matches!(err, MarkframeError::Config(_)));
}

#[test]
fn test_brightness_ignored_for_gradients() {
    let mut style = StyleConfig::default();
    style.set_brightness(10);
    assert!(!matches!(style.background, Background::Image { .. }));
}

// ============================================================================
// Data URLs and Uploads
// ============================================================================

#[test]
fn test_bad_data_urls() {
    for url in ["", "image/png;base64,AAAA", "data:image/png,AAAA", "data:image/png;base64", "data:image/png;base64,!!!"] {
        let err = decode_data_url(url).unwrap_err();
        assert!(matches!(err, MarkframeError::InvalidDataUrl(_)), "{url}");
    }
}

#[test]
fn test_upload_rejects_non_image_bytes() {
    assert!(image_data_url(b"plain text, not an image").is_err());
}

#[test]
fn test_upload_missing_file_is_io_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = read_image_data_url(&dir.path().join("missing.png")).unwrap_err();
    assert!(matches!(err, MarkframeError::Io(_)));
}

#[test]
fn test_user_messages_only_for_user_actions() {
    assert!(MarkframeError::CaptureFailed("x".into()).user_message().is_some());
    assert!(MarkframeError::ClipboardWriteFailed("x".into()).user_message().is_some());
    assert!(MarkframeError::CapabilityNotReady(CapabilityKind::Rasterizer)
        .user_message()
        .is_none());
    assert!(MarkframeError::ShieldMismatch { index: 0 }.user_message().is_none());
}
