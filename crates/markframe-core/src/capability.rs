//! Capability registry: readiness tracking for externally loaded providers
//!
//! The Markdown parser, math typesetter (plus its auto-render delimiter
//! helper), syntax highlighter and rasterizer are all loaded lazily. The core
//! never assumes any of them is available; it asks the registry.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  CapabilityRegistry (one per process, see `global()`)      │
//! │  ├── slot per CapabilityKind, created on first request     │
//! │  │   ├── watch::Sender<CapabilityStatus>                   │
//! │  │   └── provider: Arc<dyn Any> once Ready                 │
//! │  └── event_tx: broadcast of every status transition        │
//! │                                                            │
//! │  Idle ──request──▶ Loading ──▶ Ready | Error               │
//! │  (slots are never removed)                                 │
//! └────────────────────────────────────────────────────────────┘
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::{GlassRasterizer, Rasterizer};
use crate::markdown::{MarkdownParser, PulldownParser};
use crate::postprocess::{AutoRender, Highlighter, MathMlTypesetter, MathTypesetter, SyntectHighlighter};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Identifier of an external capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// Markdown to HTML parser
    MarkdownParser,
    /// TeX to markup typesetter
    MathTypesetter,
    /// Delimiter scanner that finds math spans in rendered text
    MathAutoRender,
    /// Code block syntax highlighter
    Highlighter,
    /// Node to raster image renderer
    Rasterizer,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 5] = [
        CapabilityKind::MarkdownParser,
        CapabilityKind::MathTypesetter,
        CapabilityKind::MathAutoRender,
        CapabilityKind::Highlighter,
        CapabilityKind::Rasterizer,
    ];

    /// Stable resource identifier.
    pub fn id(&self) -> &'static str {
        match self {
            CapabilityKind::MarkdownParser => "markdown-parser",
            CapabilityKind::MathTypesetter => "math-typesetter",
            CapabilityKind::MathAutoRender => "math-auto-render",
            CapabilityKind::Highlighter => "highlighter",
            CapabilityKind::Rasterizer => "rasterizer",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Load status of a capability.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CapabilityStatus {
    /// Never requested
    #[default]
    Idle,
    /// Requested, not finished
    Loading,
    /// Provider installed and usable
    Ready,
    /// Loading failed; the dependent enhancement is skipped
    Error(String),
}

impl CapabilityStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, CapabilityStatus::Ready)
    }

    /// True once loading has finished one way or the other.
    pub fn is_settled(&self) -> bool {
        matches!(self, CapabilityStatus::Ready | CapabilityStatus::Error(_))
    }
}

impl fmt::Display for CapabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityStatus::Idle => write!(f, "idle"),
            CapabilityStatus::Loading => write!(f, "loading"),
            CapabilityStatus::Ready => write!(f, "ready"),
            CapabilityStatus::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// A status transition broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityEvent {
    pub kind: CapabilityKind,
    pub status: CapabilityStatus,
}

struct Slot {
    status: watch::Sender<CapabilityStatus>,
    provider: Option<Arc<dyn Any + Send + Sync>>,
}

impl Slot {
    fn new() -> Self {
        let (status, _) = watch::channel(CapabilityStatus::Idle);
        Self {
            status,
            provider: None,
        }
    }
}

/// Registry of capability slots keyed by [`CapabilityKind`].
pub struct CapabilityRegistry {
    slots: Mutex<HashMap<CapabilityKind, Slot>>,
    event_tx: broadcast::Sender<CapabilityEvent>,
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock();
        let mut map = f.debug_map();
        for (kind, slot) in slots.iter() {
            map.entry(kind, &*slot.status.borrow());
        }
        map.finish()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: OnceLock<Arc<CapabilityRegistry>> = OnceLock::new();

impl CapabilityRegistry {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            slots: Mutex::new(HashMap::new()),
            event_tx,
        }
    }

    /// Process-wide registry.
    pub fn global() -> &'static Arc<CapabilityRegistry> {
        GLOBAL_REGISTRY.get_or_init(|| Arc::new(CapabilityRegistry::new()))
    }

    /// Current status; `Idle` for capabilities nobody has requested.
    pub fn status(&self, kind: CapabilityKind) -> CapabilityStatus {
        self.slots
            .lock()
            .get(&kind)
            .map(|slot| slot.status.borrow().clone())
            .unwrap_or_default()
    }

    pub fn is_ready(&self, kind: CapabilityKind) -> bool {
        self.status(kind).is_ready()
    }

    /// Readiness signal for one capability.
    pub fn subscribe(&self, kind: CapabilityKind) -> watch::Receiver<CapabilityStatus> {
        self.slots
            .lock()
            .entry(kind)
            .or_insert_with(Slot::new)
            .status
            .subscribe()
    }

    /// Stream of every status transition across all capabilities.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CapabilityEvent> {
        self.event_tx.subscribe()
    }

    /// Move `kind` from `Idle` to `Loading`.
    ///
    /// Returns false if the capability was already requested; a capability
    /// is only ever loaded once per registry.
    pub fn begin_loading(&self, kind: CapabilityKind) -> bool {
        let mut slots = self.slots.lock();
        let slot = slots.entry(kind).or_insert_with(Slot::new);
        if *slot.status.borrow() != CapabilityStatus::Idle {
            return false;
        }
        slot.status.send_replace(CapabilityStatus::Loading);
        drop(slots);
        self.emit(kind, CapabilityStatus::Loading);
        true
    }

    /// Install a loaded provider and mark the capability ready.
    pub fn install<T>(&self, kind: CapabilityKind, provider: T)
    where
        T: Any + Send + Sync,
    {
        {
            let mut slots = self.slots.lock();
            let slot = slots.entry(kind).or_insert_with(Slot::new);
            slot.provider = Some(Arc::new(provider));
            slot.status.send_replace(CapabilityStatus::Ready);
        }
        info!(capability = %kind, "capability ready");
        self.emit(kind, CapabilityStatus::Ready);
    }

    /// Mark a capability as failed; dependants degrade gracefully.
    pub fn fail(&self, kind: CapabilityKind, reason: impl Into<String>) {
        let status = CapabilityStatus::Error(reason.into());
        {
            let mut slots = self.slots.lock();
            let slot = slots.entry(kind).or_insert_with(Slot::new);
            slot.status.send_replace(status.clone());
        }
        warn!(capability = %kind, %status, "capability failed to load");
        self.emit(kind, status);
    }

    /// Fetch the provider of a ready capability.
    ///
    /// `T` is the exact type passed to [`install`](Self::install), typically
    /// an `Arc<dyn Trait>`.
    pub fn provider<T>(&self, kind: CapabilityKind) -> Option<T>
    where
        T: Any + Clone + Send + Sync,
    {
        let slots = self.slots.lock();
        let slot = slots.get(&kind)?;
        if !slot.status.borrow().is_ready() {
            return None;
        }
        slot.provider.as_ref()?.downcast_ref::<T>().cloned()
    }

    /// Load a capability on the blocking pool.
    ///
    /// Returns `None` when the capability was already requested.
    pub fn request<T, F>(self: &Arc<Self>, kind: CapabilityKind, loader: F) -> Option<JoinHandle<()>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, String> + Send + 'static,
    {
        if !self.begin_loading(kind) {
            debug!(capability = %kind, "capability already requested");
            return None;
        }
        let registry = Arc::clone(self);
        Some(tokio::spawn(async move {
            match tokio::task::spawn_blocking(loader).await {
                Ok(Ok(provider)) => registry.install(kind, provider),
                Ok(Err(reason)) => registry.fail(kind, reason),
                Err(join_err) => registry.fail(kind, join_err.to_string()),
            }
        }))
    }

    /// Request every built-in provider.
    pub fn request_defaults(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        handles.extend(self.request(CapabilityKind::MarkdownParser, || {
            Ok(Arc::new(PulldownParser::default()) as Arc<dyn MarkdownParser>)
        }));
        handles.extend(self.request(CapabilityKind::MathTypesetter, || {
            Ok(Arc::new(MathMlTypesetter) as Arc<dyn MathTypesetter>)
        }));
        handles.extend(self.request(CapabilityKind::MathAutoRender, || {
            Ok(Arc::new(AutoRender::default()))
        }));
        handles.extend(self.request(CapabilityKind::Highlighter, || {
            Ok(Arc::new(SyntectHighlighter::load()) as Arc<dyn Highlighter>)
        }));
        handles.extend(self.request(CapabilityKind::Rasterizer, || {
            Ok(Arc::new(GlassRasterizer::default()) as Arc<dyn Rasterizer>)
        }));
        handles
    }

    /// Wait until `kind` is ready or failed.
    pub async fn settled(&self, kind: CapabilityKind) -> CapabilityStatus {
        let mut rx = self.subscribe(kind);
        let settled = match rx.wait_for(CapabilityStatus::is_settled).await {
            Ok(status) => status.clone(),
            // Sender lives inside the registry, which outlives `&self`.
            Err(_) => self.status(kind),
        };
        settled
    }

    fn emit(&self, kind: CapabilityKind, status: CapabilityStatus) {
        // No subscribers is fine.
        let _ = self.event_tx.send(CapabilityEvent { kind, status });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrequested_capability_is_idle() {
        let registry = CapabilityRegistry::new();
        assert_eq!(
            registry.status(CapabilityKind::Highlighter),
            CapabilityStatus::Idle
        );
        assert!(registry
            .provider::<Arc<dyn Highlighter>>(CapabilityKind::Highlighter)
            .is_none());
    }

    #[test]
    fn test_begin_loading_only_once() {
        let registry = CapabilityRegistry::new();
        assert!(registry.begin_loading(CapabilityKind::Rasterizer));
        assert!(!registry.begin_loading(CapabilityKind::Rasterizer));
        assert_eq!(
            registry.status(CapabilityKind::Rasterizer),
            CapabilityStatus::Loading
        );
    }

    #[test]
    fn test_install_makes_provider_available() {
        let registry = CapabilityRegistry::new();
        registry.begin_loading(CapabilityKind::MarkdownParser);
        registry.install(
            CapabilityKind::MarkdownParser,
            Arc::new(PulldownParser::default()) as Arc<dyn MarkdownParser>,
        );
        assert!(registry.is_ready(CapabilityKind::MarkdownParser));
        let parser = registry
            .provider::<Arc<dyn MarkdownParser>>(CapabilityKind::MarkdownParser)
            .unwrap();
        assert!(parser.parse("**hi**").contains("<strong>hi</strong>"));
    }

    #[test]
    fn test_provider_with_wrong_type_is_none() {
        let registry = CapabilityRegistry::new();
        registry.install(CapabilityKind::MathAutoRender, Arc::new(AutoRender::default()));
        assert!(registry
            .provider::<Arc<dyn Highlighter>>(CapabilityKind::MathAutoRender)
            .is_none());
        assert!(registry
            .provider::<Arc<AutoRender>>(CapabilityKind::MathAutoRender)
            .is_some());
    }

    #[test]
    fn test_failed_capability_has_no_provider() {
        let registry = CapabilityRegistry::new();
        registry.begin_loading(CapabilityKind::Highlighter);
        registry.fail(CapabilityKind::Highlighter, "network down");
        assert_eq!(
            registry.status(CapabilityKind::Highlighter),
            CapabilityStatus::Error("network down".to_string())
        );
        assert!(registry.status(CapabilityKind::Highlighter).is_settled());
    }

    #[test]
    fn test_events_are_broadcast() {
        let registry = CapabilityRegistry::new();
        let mut events = registry.subscribe_events();
        registry.begin_loading(CapabilityKind::Rasterizer);
        registry.fail(CapabilityKind::Rasterizer, "nope");

        let first = events.try_recv().unwrap();
        assert_eq!(first.kind, CapabilityKind::Rasterizer);
        assert_eq!(first.status, CapabilityStatus::Loading);
        let second = events.try_recv().unwrap();
        assert!(matches!(second.status, CapabilityStatus::Error(_)));
    }

    #[tokio::test]
    async fn test_request_loads_on_blocking_pool() {
        let registry = Arc::new(CapabilityRegistry::new());
        let handle = registry
            .request(CapabilityKind::MathAutoRender, || Ok(Arc::new(AutoRender::default())))
            .unwrap();
        handle.await.unwrap();
        assert!(registry.is_ready(CapabilityKind::MathAutoRender));

        // Second request is a no-op
        assert!(registry
            .request(CapabilityKind::MathAutoRender, || Ok(Arc::new(AutoRender::default())))
            .is_none());
    }

    #[tokio::test]
    async fn test_settled_waits_for_error() {
        let registry = Arc::new(CapabilityRegistry::new());
        registry.request::<Arc<AutoRender>, _>(CapabilityKind::MathAutoRender, || {
            Err("bad bundle".to_string())
        });
        let status = registry.settled(CapabilityKind::MathAutoRender).await;
        assert_eq!(status, CapabilityStatus::Error("bad bundle".to_string()));
    }

    #[tokio::test]
    async fn test_settled_returns_immediately_when_ready() {
        let registry = Arc::new(CapabilityRegistry::new());
        registry.install(CapabilityKind::MathAutoRender, Arc::new(AutoRender::default()));
        let status = registry.settled(CapabilityKind::MathAutoRender).await;
        assert_eq!(status, CapabilityStatus::Ready);
        // Receiver dropped; the registry still answers
        assert!(registry.is_ready(CapabilityKind::MathAutoRender));
    }
}
