//! Console logging setup shared by the binaries.
//!
//! ```ignore
//! use markframe_core::logging::LoggingBuilder;
//!
//! LoggingBuilder::from_verbosity(args.verbose).init();
//! ```
//!
//! `RUST_LOG` always wins over the configured filter.

use tracing_subscriber::EnvFilter;

/// Filter used when nothing else is configured.
pub const DEFAULT_FILTER: &str = "markframe=info,markframe_core=info,warn";

/// Builder for the global tracing subscriber.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    env_filter: String,
    with_target: bool,
    ansi: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            env_filter: DEFAULT_FILTER.to_string(),
            with_target: true,
            ansi: true,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a `-v` count to a filter: warn, info, debug, then trace.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let filter = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self::default().with_filter(filter)
    }

    /// Set the fallback filter (e.g. "markframe_core=debug").
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = filter.into();
        self
    }

    pub fn without_target(mut self) -> Self {
        self.with_target = false;
        self
    }

    pub fn no_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    pub fn filter(&self) -> &str {
        &self.env_filter
    }

    /// The filter that would be installed right now.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.env_filter))
    }

    /// Install the subscriber; false if one was already installed.
    pub fn init(self) -> bool {
        tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_target(self.with_target)
            .with_ansi(self.ansi)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    }
}
