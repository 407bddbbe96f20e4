//! Global CSS styles for MarkFrame.
//!
//! Light studio chrome around the glass card preview.

pub const GLOBAL_STYLES: &str = r#"
/* === CSS Custom Properties === */
:root {
  /* Chrome */
  --chrome-bg: #f8fafc;
  --chrome-panel: #ffffff;
  --chrome-border: #e2e8f0;
  --chrome-text: #0f172a;
  --chrome-muted: #64748b;

  /* Accent */
  --accent: #6366f1;
  --accent-soft: rgba(99, 102, 241, 0.12);

  /* Status */
  --ready: #16a34a;
  --loading: #d97706;
  --danger: #dc2626;

  /* Typography */
  --font-ui: 'Inter', -apple-system, 'Segoe UI', sans-serif;
  --font-mono: 'JetBrains Mono', 'SF Mono', 'Consolas', monospace;

  /* Type Scale */
  --text-xs: 0.75rem;
  --text-sm: 0.875rem;
  --text-base: 1rem;

  /* Transitions */
  --transition-fast: 150ms ease;
}

/* === Global Reset === */
*, *::before, *::after {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

html {
  font-size: 16px;
  -webkit-font-smoothing: antialiased;
  -moz-osx-font-smoothing: grayscale;
}

body {
  font-family: var(--font-ui);
  background: var(--chrome-bg);
  color: var(--chrome-text);
  line-height: 1.5;
  min-height: 100vh;
  overflow: hidden;
}

/* === App Shell === */
.app-shell {
  display: flex;
  height: 100vh;
  width: 100vw;
}

/* === Sidebar === */
.sidebar {
  position: relative;
  display: flex;
  flex-direction: column;
  flex-shrink: 0;
  background: var(--chrome-panel);
  border-right: 1px solid var(--chrome-border);
}

.sidebar__brand {
  padding: 1rem 1.25rem;
  border-bottom: 1px solid var(--chrome-border);
}

.sidebar__logo {
  font-weight: 700;
  letter-spacing: -0.02em;
}

.sidebar__scroll {
  flex: 1;
  overflow-y: auto;
  padding: 1rem 1.25rem 2rem;
  display: flex;
  flex-direction: column;
  gap: 1.5rem;
}

/* === Panels === */
.panel {
  display: flex;
  flex-direction: column;
  gap: 0.75rem;
}

.panel__header {
  display: flex;
  justify-content: space-between;
  align-items: baseline;
  margin-top: 0.5rem;
}

.panel__title {
  font-size: var(--text-xs);
  font-weight: 600;
  text-transform: uppercase;
  letter-spacing: 0.08em;
  color: var(--chrome-muted);
}

.panel__meta {
  font-size: var(--text-xs);
  color: var(--chrome-muted);
}

/* === Markdown Editor === */
.md-toolbar {
  display: flex;
  gap: 0.25rem;
  flex-wrap: wrap;
}

.md-btn {
  min-width: 2rem;
  padding: 0.25rem 0.5rem;
  background: transparent;
  border: 1px solid var(--chrome-border);
  border-radius: 6px;
  color: var(--chrome-text);
  font-family: var(--font-mono);
  font-size: var(--text-xs);
  cursor: pointer;
  transition: all var(--transition-fast);
}

.md-btn:hover {
  border-color: var(--accent);
  background: var(--accent-soft);
}

.md-textarea {
  width: 100%;
  min-height: 260px;
  padding: 0.75rem;
  border: 1px solid var(--chrome-border);
  border-radius: 8px;
  background: var(--chrome-bg);
  color: var(--chrome-text);
  font-family: var(--font-mono);
  font-size: var(--text-sm);
  line-height: 1.6;
  resize: vertical;
}

.md-textarea:focus {
  outline: none;
  border-color: var(--accent);
  box-shadow: 0 0 0 3px var(--accent-soft);
}

/* === Tabs === */
.tabs, .theme-toggle {
  display: flex;
  gap: 0.25rem;
  padding: 0.25rem;
  background: var(--chrome-bg);
  border-radius: 8px;
}

.tab {
  flex: 1;
  padding: 0.375rem 0.5rem;
  background: transparent;
  border: none;
  border-radius: 6px;
  color: var(--chrome-muted);
  font-size: var(--text-sm);
  cursor: pointer;
}

.tab--active {
  background: var(--chrome-panel);
  color: var(--chrome-text);
  box-shadow: 0 1px 2px rgba(15, 23, 42, 0.08);
}

/* === Swatches === */
.swatch-grid {
  display: grid;
  grid-template-columns: repeat(4, 1fr);
  gap: 0.5rem;
}

.swatch {
  aspect-ratio: 1;
  border: 2px solid transparent;
  border-radius: 10px;
  cursor: pointer;
}

.swatch--active {
  border-color: var(--accent);
}

.swatch-row {
  display: flex;
  gap: 0.5rem;
  flex-wrap: wrap;
}

.dot {
  width: 1.5rem;
  height: 1.5rem;
  border-radius: 50%;
  border: 2px solid var(--chrome-border);
  cursor: pointer;
}

.dot--active {
  border-color: var(--accent);
  box-shadow: 0 0 0 2px var(--accent-soft);
}

/* === Custom Gradient === */
.custom-gradient {
  display: flex;
  gap: 0.75rem;
  align-items: center;
  flex-wrap: wrap;
}

.color-field {
  display: flex;
  align-items: center;
  gap: 0.375rem;
  font-size: var(--text-sm);
}

.select {
  padding: 0.375rem 0.5rem;
  border: 1px solid var(--chrome-border);
  border-radius: 6px;
  background: var(--chrome-panel);
  font-size: var(--text-sm);
}

/* === Sliders === */
.slider {
  display: flex;
  flex-direction: column;
  gap: 0.25rem;
}

.slider__row {
  display: flex;
  justify-content: space-between;
  font-size: var(--text-sm);
}

.slider__value {
  color: var(--chrome-muted);
  font-family: var(--font-mono);
  font-size: var(--text-xs);
}

.slider input[type="range"] {
  width: 100%;
  accent-color: var(--accent);
}

/* === Fonts === */
.font-grid {
  display: grid;
  grid-template-columns: repeat(3, 1fr);
  gap: 0.375rem;
}

.font-btn {
  padding: 0.5rem;
  border: 1px solid var(--chrome-border);
  border-radius: 6px;
  background: transparent;
  font-size: var(--text-sm);
  cursor: pointer;
}

.font-btn--active {
  border-color: var(--accent);
  background: var(--accent-soft);
}

/* === Image Upload === */
.image-upload {
  display: flex;
  flex-direction: column;
  gap: 0.75rem;
}

.image-upload-btn {
  padding: 0.625rem;
  border: 1px dashed var(--chrome-border);
  border-radius: 8px;
  background: var(--chrome-bg);
  color: var(--chrome-text);
  cursor: pointer;
}

.image-upload-btn:hover {
  border-color: var(--accent);
}

.image-upload__error {
  color: var(--danger);
  font-size: var(--text-xs);
}

/* === Workspace === */
.workspace {
  flex: 1;
  display: flex;
  flex-direction: column;
  min-width: 0;
}

/* === Toolbar === */
.toolbar {
  display: flex;
  align-items: center;
  justify-content: space-between;
  gap: 1rem;
  padding: 0.75rem 1.25rem;
  border-bottom: 1px solid var(--chrome-border);
  background: var(--chrome-panel);
}

.toolbar__status {
  display: flex;
  gap: 0.375rem;
  flex-wrap: wrap;
}

.toolbar__notice {
  font-size: var(--text-xs);
  color: var(--chrome-muted);
  overflow: hidden;
  text-overflow: ellipsis;
  white-space: nowrap;
}

.toolbar__actions {
  display: flex;
  gap: 0.5rem;
}

.chip {
  padding: 0.125rem 0.5rem;
  border-radius: 999px;
  border: 1px solid var(--chrome-border);
  color: var(--chrome-muted);
  font-family: var(--font-mono);
  font-size: 0.6875rem;
}

.chip--ready { color: var(--ready); border-color: rgba(22, 163, 74, 0.3); }
.chip--loading { color: var(--loading); border-color: rgba(217, 119, 6, 0.3); }
.chip--error { color: var(--danger); border-color: rgba(220, 38, 38, 0.3); }

/* === Buttons === */
.btn {
  padding: 0.5rem 1rem;
  border-radius: 8px;
  font-size: var(--text-sm);
  font-weight: 500;
  cursor: pointer;
  transition: all var(--transition-fast);
}

.btn:disabled {
  opacity: 0.5;
  cursor: not-allowed;
}

.btn--primary {
  background: var(--chrome-text);
  border: 1px solid var(--chrome-text);
  color: #ffffff;
}

.btn--secondary {
  background: transparent;
  border: 1px solid var(--chrome-border);
  color: var(--chrome-text);
}

/* === Stage & Frame === */
.stage {
  flex: 1;
  overflow: auto;
  display: flex;
  flex-direction: column;
  align-items: center;
  justify-content: center;
  gap: 0.75rem;
  padding: 2rem;
}

.frame {
  position: relative;
  display: flex;
  flex-shrink: 0;
  overflow: hidden;
}

.frame__backdrop {
  position: absolute;
  inset: 0;
}

.frame__watermark {
  position: absolute;
  bottom: 14px;
  left: 0;
  right: 0;
  text-align: center;
  font-size: var(--text-xs);
  font-weight: 600;
  letter-spacing: 0.08em;
  color: rgba(255, 255, 255, 0.7);
  pointer-events: none;
}

.stage__size {
  font-family: var(--font-mono);
  font-size: var(--text-xs);
  color: var(--chrome-muted);
}

/* === Glass Card === */
.card {
  position: relative;
  flex: 1;
  overflow: hidden;
}

.card__layer {
  position: absolute;
  inset: 0;
}

.card__dots {
  position: absolute;
  display: flex;
  z-index: 2;
}

.card__dot {
  display: block;
  border-radius: 50%;
}

/* === Card Content === */
.card-content {
  position: relative;
  z-index: 1;
  line-height: 1.65;
}

.card-content h1, .card-content h2, .card-content h3 {
  margin: 0.6em 0 0.4em 0;
  line-height: 1.25;
}

.card-content h1 { font-size: 2em; }
.card-content h2 { font-size: 1.5em; }
.card-content h3 { font-size: 1.2em; }

.card-content p {
  margin-bottom: 0.8em;
}

.card-content ul, .card-content ol {
  margin-left: 1.5em;
  margin-bottom: 0.8em;
}

.card-content blockquote {
  border-left: 3px solid currentColor;
  padding-left: 1rem;
  margin: 1em 0;
  opacity: 0.8;
  font-style: italic;
}

.card-content code {
  font-family: var(--font-mono);
  font-size: 0.875em;
  padding: 2px 6px;
  border-radius: 4px;
}

.card-content pre {
  padding: 1rem;
  border-radius: 10px;
  overflow-x: auto;
  margin: 1em 0;
}

.card-content pre code {
  padding: 0;
  background: none;
}

.card-content--light code { background: rgba(15, 23, 42, 0.06); }
.card-content--light pre { background: rgba(255, 255, 255, 0.7); }
.card-content--dark code { background: rgba(255, 255, 255, 0.1); }
.card-content--dark pre { background: rgba(15, 23, 42, 0.6); }

.card-content .math-display {
  display: block;
  text-align: center;
  margin: 1em 0;
  overflow-x: auto;
}

/* === Resize Handles === */
.resize-handle--canvas {
  position: absolute;
  right: 10px;
  bottom: 10px;
  width: 18px;
  height: 18px;
  border-right: 3px solid rgba(255, 255, 255, 0.8);
  border-bottom: 3px solid rgba(255, 255, 255, 0.8);
  border-radius: 0 0 6px 0;
  cursor: nwse-resize;
  z-index: 3;
}

.resize-handle--sidebar {
  position: absolute;
  top: 0;
  right: -3px;
  width: 6px;
  height: 100%;
  cursor: ew-resize;
  z-index: 3;
}

.resize-handle--sidebar:hover {
  background: var(--accent-soft);
}

.drag-overlay {
  position: fixed;
  inset: 0;
  z-index: 1000;
  user-select: none;
}
"#;
