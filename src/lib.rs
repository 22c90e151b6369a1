//! pastelit - off-main-thread syntax highlighting for a snippet viewer
//!
//! The UI side of a pastebin-like tool hands this crate a raw snippet
//! string and gets back structured per-line HTML. All detection, parsing
//! and rendering happens on a background worker thread behind
//! [`HighlightBridge`], which correlates responses to callers, cancels
//! stale requests by supersession, and degrades to escaped plain text on
//! timeout or worker failure.
//!
//! ```no_run
//! use pastelit::{HighlightBridge, HighlightConfig};
//!
//! let bridge = HighlightBridge::spawn(HighlightConfig::default());
//! let result = bridge.highlight("fn main() {}", None);
//! for line in &result.lines {
//!     println!("{}", line.html);
//! }
//! ```

pub mod bridge;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod html;
pub mod syntax;
pub mod tracing;

// Re-export commonly used types
pub use bridge::{
    FallbackReason, HighlightBridge, HighlightError, HighlightOrigin, HighlightTicket,
    HighlightedText, RequestId,
};
pub use config::HighlightConfig;
pub use html::HighlightedLine;
pub use syntax::LanguageId;
