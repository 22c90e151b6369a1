//! Syntax highlighting module
//!
//! Tree-sitter based highlighting for pasted snippets:
//! - Language detection from snippet content (no filenames here)
//! - Parsing and highlight extraction on the worker thread
//! - Per-line tokens handed to the HTML renderer
//!
//! ## Pipeline
//!
//! ```text
//! HighlightBridge::request → (worker thread)
//!     LanguageId::detect → HighlightEngine::highlight
//!     → html::render_lines → dispatcher → caller's ticket
//! ```

mod highlights;
mod languages;
mod parser;

pub use highlights::{
    highlight_id_for_name, HighlightId, HighlightToken, LineHighlights, SyntaxHighlights,
    HIGHLIGHT_NAMES,
};
pub use languages::LanguageId;
pub use parser::{EngineError, HighlightEngine};
