//! Visual theme for the desktop shell.

mod styles;

pub use styles::GLOBAL_STYLES;
