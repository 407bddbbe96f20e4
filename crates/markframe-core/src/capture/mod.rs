//! Capture of the rendered card to a PNG.
//!
//! ```text
//!   capture(node, target)
//!     │  rasterizer ready?            no  → CapabilityNotReady
//!     │  busy flag free? (CAS)        no  → Busy (no-op)
//!     │  sleep 100 ms                 host hides the resize handle
//!     │  grow node to fit content     min-height semantics
//!     │  rasterize at target scale    err → CaptureFailed
//!     ├─ File       PNG → data URL → DownloadSink
//!     └─ Clipboard  PNG → ClipboardSink      err → ClipboardWriteFailed
//!   busy flag cleared on every path (drop guard)
//! ```
//!
//! Both targets share one busy flag, so only one capture of either kind runs
//! at a time.

mod content;
pub mod delivery;
pub mod fonts;
pub mod raster;
mod text;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::capability::{CapabilityKind, CapabilityRegistry};
use crate::dataurl::to_data_url;
use crate::error::{MarkframeError, MarkframeResult};
use crate::style::CompositedStyle;

pub use delivery::{png_bytes, ClipboardSink, DirectoryDownloads, DownloadSink, SystemClipboard};
pub use fonts::FontLibrary;
pub use raster::{GlassRasterizer, Rasterizer};

/// Delay between raising the busy flag and rasterizing.
pub const PAINT_DELAY: Duration = Duration::from_millis(100);

/// Largest output side in pixels, after scaling.
pub const MAX_CAPTURE_SIDE: u32 = 16_384;

/// Where a capture goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureTarget {
    File,
    Clipboard,
}

impl CaptureTarget {
    /// Device pixel ratio used for this target.
    pub fn scale(&self) -> u32 {
        match self {
            CaptureTarget::File => 3,
            CaptureTarget::Clipboard => 2,
        }
    }
}

/// A capture request with its resolved scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportJob {
    pub target: CaptureTarget,
    pub scale: u32,
}

impl ExportJob {
    /// Output pixel size of `node` for this job.
    pub fn output_size(&self, node: &CaptureNode) -> MarkframeResult<(u32, u32)> {
        let scaled = |side: u32| side.checked_mul(self.scale).filter(|px| *px <= MAX_CAPTURE_SIDE);
        match (scaled(node.width), scaled(node.height)) {
            (Some(width), Some(height)) => Ok((width, height)),
            _ => Err(MarkframeError::CaptureFailed(format!(
                "{}x{} at scale {} exceeds {MAX_CAPTURE_SIDE} px",
                node.width, node.height, self.scale
            ))),
        }
    }
}

impl From<CaptureTarget> for ExportJob {
    fn from(target: CaptureTarget) -> Self {
        Self {
            target,
            scale: target.scale(),
        }
    }
}

/// The node being captured: displayed size, composited style and content.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureNode {
    /// Displayed width, CSS px
    pub width: u32,
    /// Displayed height, CSS px
    pub height: u32,
    pub style: CompositedStyle,
    /// Post-processed content markup
    pub content_html: String,
}

impl CaptureNode {
    pub fn new(width: u32, height: u32, style: CompositedStyle, content_html: String) -> Self {
        Self {
            width,
            height,
            style,
            content_html,
        }
    }

    /// Grow to `height` if that is taller; never shrinks.
    pub fn with_min_height(mut self, height: u32) -> Self {
        self.height = self.height.max(height);
        self
    }
}

/// Grow `node` to the height its content needs.
pub fn fit_content(rasterizer: &dyn Rasterizer, node: CaptureNode) -> CaptureNode {
    match rasterizer.natural_height(&node) {
        Some(height) if height > node.height => {
            debug!(from = node.height, to = height, "capture grows to fit content");
            node.with_min_height(height)
        }
        _ => node,
    }
}

/// Outcome of a capture that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Another capture was in flight; nothing happened
    Busy,
    Saved { filename: String, path: PathBuf },
    Copied { width: u32, height: u32 },
}

/// Source of wall-clock time for export filenames.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// `markframe-<epoch-millis>.png`
pub fn export_filename(epoch_millis: i64) -> String {
    format!("markframe-{epoch_millis}.png")
}

/// Clears the busy flag when dropped.
struct BusyGuard {
    busy: Arc<AtomicBool>,
    signal: Arc<watch::Sender<bool>>,
}

impl BusyGuard {
    fn acquire(busy: &Arc<AtomicBool>, signal: &Arc<watch::Sender<bool>>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        signal.send_replace(true);
        Some(Self {
            busy: Arc::clone(busy),
            signal: Arc::clone(signal),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        self.signal.send_replace(false);
    }
}

/// Rasterizes a [`CaptureNode`] and delivers the PNG.
#[derive(Clone)]
pub struct CaptureEngine {
    registry: Arc<CapabilityRegistry>,
    busy: Arc<AtomicBool>,
    busy_signal: Arc<watch::Sender<bool>>,
    downloads: Arc<dyn DownloadSink>,
    clipboard: Arc<dyn ClipboardSink>,
    clock: Arc<dyn Clock>,
    paint_delay: Duration,
}

impl std::fmt::Debug for CaptureEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureEngine")
            .field("busy", &self.is_busy())
            .field("paint_delay", &self.paint_delay)
            .finish_non_exhaustive()
    }
}

impl CaptureEngine {
    /// Engine delivering to the user's download directory and the system
    /// clipboard.
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        let (busy_signal, _) = watch::channel(false);
        Self {
            registry,
            busy: Arc::new(AtomicBool::new(false)),
            busy_signal: Arc::new(busy_signal),
            downloads: Arc::new(DirectoryDownloads::user_default()),
            clipboard: Arc::new(SystemClipboard),
            clock: Arc::new(SystemClock),
            paint_delay: PAINT_DELAY,
        }
    }

    pub fn with_downloads(mut self, sink: Arc<dyn DownloadSink>) -> Self {
        self.downloads = sink;
        self
    }

    pub fn with_clipboard(mut self, sink: Arc<dyn ClipboardSink>) -> Self {
        self.clipboard = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_paint_delay(mut self, delay: Duration) -> Self {
        self.paint_delay = delay;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// The resize handle is shown only while no capture is running.
    pub fn resize_handle_visible(&self) -> bool {
        !self.is_busy()
    }

    /// Follows the busy flag; `true` while a capture runs.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy_signal.subscribe()
    }

    /// Capture `node` for `target`.
    pub async fn capture(&self, node: &CaptureNode, target: CaptureTarget) -> MarkframeResult<CaptureOutcome> {
        let rasterizer = self
            .registry
            .provider::<Arc<dyn Rasterizer>>(CapabilityKind::Rasterizer)
            .ok_or(MarkframeError::CapabilityNotReady(CapabilityKind::Rasterizer))?;

        let Some(_guard) = BusyGuard::acquire(&self.busy, &self.busy_signal) else {
            debug!(?target, "capture already in flight");
            return Ok(CaptureOutcome::Busy);
        };

        let job = ExportJob::from(target);
        tokio::time::sleep(self.paint_delay).await;

        let image = match self.rasterize(rasterizer, node, job).await {
            Ok(image) => image,
            Err(err) => {
                error!(?target, %err, "capture failed");
                return Err(err);
            }
        };

        let result = self.deliver(job, &image);
        if let Err(err) = &result {
            error!(?target, %err, "delivery failed");
        }
        result
    }

    async fn rasterize(
        &self,
        rasterizer: Arc<dyn Rasterizer>,
        node: &CaptureNode,
        job: ExportJob,
    ) -> MarkframeResult<image::RgbaImage> {
        job.output_size(node)?;
        let owned = node.clone();
        let (image, expected) = tokio::task::spawn_blocking(move || -> MarkframeResult<_> {
            let node = fit_content(rasterizer.as_ref(), owned);
            let expected = job.output_size(&node)?;
            let image = rasterizer
                .rasterize(&node, job.scale)
                .map_err(MarkframeError::CaptureFailed)?;
            Ok((image, expected))
        })
        .await
        .map_err(|e| MarkframeError::CaptureFailed(e.to_string()))??;

        if image.dimensions() != expected {
            return Err(MarkframeError::CaptureFailed(format!(
                "rasterizer produced {:?}, expected {:?}",
                image.dimensions(),
                expected
            )));
        }
        Ok(image)
    }

    fn deliver(&self, job: ExportJob, image: &image::RgbaImage) -> MarkframeResult<CaptureOutcome> {
        match job.target {
            CaptureTarget::File => {
                let png = png_bytes(image).map_err(|e| MarkframeError::CaptureFailed(e.to_string()))?;
                let filename = export_filename(self.clock.now_millis());
                let path = self
                    .downloads
                    .download(&filename, &to_data_url("image/png", &png))
                    .map_err(|e| MarkframeError::CaptureFailed(e.to_string()))?;
                info!(%filename, "export saved");
                Ok(CaptureOutcome::Saved { filename, path })
            }
            CaptureTarget::Clipboard => {
                let png = png_bytes(image).map_err(|e| MarkframeError::ClipboardWriteFailed(e.to_string()))?;
                self.clipboard.write_png(&png, image).map_err(|e| match e {
                    err @ MarkframeError::ClipboardWriteFailed(_) => err,
                    other => MarkframeError::ClipboardWriteFailed(other.to_string()),
                })?;
                Ok(CaptureOutcome::Copied {
                    width: image.width(),
                    height: image.height(),
                })
            }
        }
    }
}
