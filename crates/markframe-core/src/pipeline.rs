//! Document → HTML → mounted tree → post-processed tree.
//!
//! ```text
//!   update(document)
//!     │  MarkdownRenderer (shield / parse / unshield)
//!     │     Deferred → keep previous tree
//!     ▼
//!   mount: Fragment::parse(html)            revision += 1
//!     │
//!     └─ schedule("post-process", 50 ms)    a newer update cancels it
//!            │
//!            ▼
//!        PostProcessor::run(&mut tree)      revision += 1
//! ```
//!
//! Capability readiness transitions feed back in through
//! [`RenderPipeline::on_capability`]: a ready parser re-renders, a ready
//! enhancement capability re-runs post-processing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::capability::{CapabilityEvent, CapabilityKind, CapabilityRegistry, CapabilityStatus};
use crate::dom::Fragment;
use crate::error::MarkframeResult;
use crate::markdown::{MarkdownParser, MarkdownRenderer, RenderOutcome};
use crate::postprocess::{PassReport, PostProcessor, POST_PROCESS_DELAY, POST_PROCESS_TASK};
use crate::scheduler::{TaskHandle, TaskScheduler};
use crate::style::ThemeMode;

/// The live rendering pipeline. Clones share state.
#[derive(Clone)]
pub struct RenderPipeline {
    registry: Arc<CapabilityRegistry>,
    scheduler: TaskScheduler,
    renderer: Arc<Mutex<MarkdownRenderer>>,
    mounted: Arc<Mutex<Fragment>>,
    theme: Arc<Mutex<ThemeMode>>,
    post_delay: Duration,
    revision: Arc<watch::Sender<u64>>,
    passes: Arc<AtomicU64>,
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("revision", &*self.revision.borrow())
            .field("passes", &self.passes.load(Ordering::Relaxed))
            .field("theme", &*self.theme.lock())
            .finish_non_exhaustive()
    }
}

impl RenderPipeline {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            registry,
            scheduler: TaskScheduler::new(),
            renderer: Arc::new(Mutex::new(MarkdownRenderer::new())),
            mounted: Arc::new(Mutex::new(Fragment::default())),
            theme: Arc::new(Mutex::new(ThemeMode::default())),
            post_delay: POST_PROCESS_DELAY,
            revision: Arc::new(revision),
            passes: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_post_delay(mut self, delay: Duration) -> Self {
        self.post_delay = delay;
        self
    }

    /// Start with `theme` without scheduling a pass.
    pub fn with_theme(self, theme: ThemeMode) -> Self {
        *self.theme.lock() = theme;
        self
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Render `document` and mount the result.
    ///
    /// Post-processing is scheduled after a successful render; needs a tokio
    /// runtime for that.
    pub fn update(&self, document: &str) -> MarkframeResult<RenderOutcome> {
        let outcome = self.render_and_mount(document)?;
        if outcome == RenderOutcome::Rendered {
            self.schedule_post_process();
        }
        Ok(outcome)
    }

    /// Render, mount and post-process synchronously.
    ///
    /// A pending debounced pass is dropped; this pass covers it.
    pub fn render_now(&self, document: &str) -> MarkframeResult<(RenderOutcome, PassReport)> {
        let outcome = self.render_and_mount(document)?;
        self.scheduler.cancel(POST_PROCESS_TASK);
        Ok((outcome, self.post_process_now()))
    }

    fn render_and_mount(&self, document: &str) -> MarkframeResult<RenderOutcome> {
        let parser = self
            .registry
            .provider::<Arc<dyn MarkdownParser>>(CapabilityKind::MarkdownParser);
        let mut renderer = self.renderer.lock();
        let outcome = renderer.update(document, parser.as_deref())?;
        if outcome == RenderOutcome::Rendered {
            *self.mounted.lock() = Fragment::parse(renderer.html());
            self.bump();
            debug!(renders = renderer.renders(), "content mounted");
        }
        Ok(outcome)
    }

    /// React to a capability status change.
    pub fn on_capability(&self, event: &CapabilityEvent, document: &str) -> MarkframeResult<()> {
        if event.status != CapabilityStatus::Ready {
            return Ok(());
        }
        match event.kind {
            CapabilityKind::MarkdownParser => {
                self.update(document)?;
            }
            CapabilityKind::MathTypesetter | CapabilityKind::MathAutoRender | CapabilityKind::Highlighter => {
                self.schedule_post_process();
            }
            CapabilityKind::Rasterizer => {}
        }
        Ok(())
    }

    pub fn theme(&self) -> ThemeMode {
        *self.theme.lock()
    }

    /// Switch highlight theme; blocks are re-highlighted on the next pass.
    pub fn set_theme(&self, theme: ThemeMode) {
        let changed = {
            let mut current = self.theme.lock();
            std::mem::replace(&mut *current, theme) != theme
        };
        if changed {
            self.schedule_post_process();
        }
    }

    /// Debounced post-processing of the mounted tree.
    pub fn schedule_post_process(&self) -> TaskHandle {
        let pipeline = self.clone();
        self.scheduler
            .schedule(POST_PROCESS_TASK, self.post_delay, move || {
                pipeline.post_process_now();
            })
    }

    /// Run both passes on the mounted tree right away.
    pub fn post_process_now(&self) -> PassReport {
        let processor = PostProcessor::from_registry(&self.registry, self.theme());
        let report = {
            let mut mounted = self.mounted.lock();
            processor.run(&mut mounted)
        };
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.bump();
        report
    }

    pub fn is_post_process_pending(&self) -> bool {
        self.scheduler.is_pending(POST_PROCESS_TASK)
    }

    /// Serialized mounted tree.
    pub fn html(&self) -> String {
        self.mounted.lock().to_html()
    }

    pub fn fragment(&self) -> Fragment {
        self.mounted.lock().clone()
    }

    pub fn text_content(&self) -> String {
        self.mounted.lock().text_content()
    }

    /// Completed post-processing passes.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Bumped on every mount and every post-processing pass.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::PulldownParser;
    use crate::postprocess::{AutoRender, Highlighter, MathMlTypesetter, MathTypesetter, SyntectHighlighter};

    fn install_parser(registry: &CapabilityRegistry) {
        registry.install(
            CapabilityKind::MarkdownParser,
            Arc::new(PulldownParser::default()) as Arc<dyn MarkdownParser>,
        );
    }

    fn install_math(registry: &CapabilityRegistry) {
        registry.install(
            CapabilityKind::MathTypesetter,
            Arc::new(MathMlTypesetter) as Arc<dyn MathTypesetter>,
        );
        registry.install(CapabilityKind::MathAutoRender, Arc::new(AutoRender::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_until_parser_ready() {
        let registry = Arc::new(CapabilityRegistry::new());
        let pipeline = RenderPipeline::new(Arc::clone(&registry));
        let document = "# Hello";

        assert_eq!(pipeline.update(document).unwrap(), RenderOutcome::Deferred);
        assert_eq!(pipeline.html(), "");

        install_parser(&registry);
        let event = CapabilityEvent {
            kind: CapabilityKind::MarkdownParser,
            status: CapabilityStatus::Ready,
        };
        pipeline.on_capability(&event, document).unwrap();
        assert_eq!(pipeline.html(), "<h1>Hello</h1>\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_process_debounced() {
        let registry = Arc::new(CapabilityRegistry::new());
        install_parser(&registry);
        install_math(&registry);
        let pipeline = RenderPipeline::new(registry);

        pipeline.update("$a$").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        pipeline.update("$b$").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        pipeline.update("$c$").unwrap();
        assert!(pipeline.is_post_process_pending());
        assert_eq!(pipeline.passes(), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(pipeline.passes(), 1);
        let html = pipeline.html();
        assert!(html.contains("math-inline"));
        assert!(html.contains("<mi>c</mi>"));
        assert_eq!(pipeline.text_content().trim_end(), "$c$");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_highlighter_triggers_pass() {
        let registry = Arc::new(CapabilityRegistry::new());
        install_parser(&registry);
        let pipeline = RenderPipeline::new(Arc::clone(&registry));
        pipeline.update("```rust\nfn main() {}\n```").unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!pipeline.html().contains("data-highlighted"));

        registry.install(
            CapabilityKind::Highlighter,
            Arc::new(SyntectHighlighter::load()) as Arc<dyn Highlighter>,
        );
        let event = CapabilityEvent {
            kind: CapabilityKind::Highlighter,
            status: CapabilityStatus::Ready,
        };
        pipeline.on_capability(&event, "ignored").unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(pipeline.html().contains("data-highlighted=\"yes\""));
        assert_eq!(pipeline.text_content().trim_end(), "fn main() {}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_theme_change_rehighlights() {
        let registry = Arc::new(CapabilityRegistry::new());
        install_parser(&registry);
        registry.install(
            CapabilityKind::Highlighter,
            Arc::new(SyntectHighlighter::load()) as Arc<dyn Highlighter>,
        );
        let pipeline = RenderPipeline::new(registry);
        pipeline.update("```rust\nlet x = 1;\n```").unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let light = pipeline.html();

        pipeline.set_theme(ThemeMode::Dark);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(pipeline.passes(), 2);
        assert_ne!(pipeline.html(), light);

        // Same theme again schedules nothing
        pipeline.set_theme(ThemeMode::Dark);
        assert!(!pipeline.is_post_process_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_revision_signal() {
        let registry = Arc::new(CapabilityRegistry::new());
        install_parser(&registry);
        let pipeline = RenderPipeline::new(registry);
        let mut rx = pipeline.subscribe();

        pipeline.update("text").unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*rx.borrow_and_update(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_now_supersedes_pending_pass() {
        let registry = Arc::new(CapabilityRegistry::new());
        install_parser(&registry);
        let pipeline = RenderPipeline::new(registry);
        pipeline.set_theme(ThemeMode::Dark);
        assert!(pipeline.is_post_process_pending());

        pipeline.render_now("text").unwrap();
        assert!(!pipeline.is_post_process_pending());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(pipeline.passes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_theme_schedules_nothing() {
        let registry = Arc::new(CapabilityRegistry::new());
        let pipeline = RenderPipeline::new(registry).with_theme(ThemeMode::Dark);
        assert_eq!(pipeline.theme(), ThemeMode::Dark);
        assert!(!pipeline.is_post_process_pending());
    }

    #[test]
    fn test_render_now_without_runtime() {
        let registry = Arc::new(CapabilityRegistry::new());
        install_parser(&registry);
        install_math(&registry);
        let pipeline = RenderPipeline::new(registry);
        let (outcome, report) = pipeline.render_now("Energy $$E = mc^2$$").unwrap();
        assert_eq!(outcome, RenderOutcome::Rendered);
        assert_eq!(report.spans_typeset, 1);
        assert!(pipeline.html().contains("math-display"));
    }
}
