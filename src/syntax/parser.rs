//! Tree-sitter engine: parsing and highlight extraction
//!
//! Owns one parser and one compiled highlight query per language, parses
//! snippet text and extracts per-line highlight tokens. Successive
//! requests are usually revisions of the same snippet (the editor view
//! re-highlights while the user types), so the engine keeps the last
//! parse around and re-parses incrementally when the language matches.
//!
//! Lives on the worker thread only; tree-sitter parsers are !Sync.

use std::collections::HashMap;

use streaming_iterator::StreamingIterator;
use tree_sitter::{InputEdit, Parser, Point, Query, QueryCursor, Tree};

use super::highlights::{highlight_id_for_name, HighlightToken, SyntaxHighlights};
use super::languages::LanguageId;

/// Engine-level failures surfaced to the bridge, which answers the caller
/// with the plain-text fallback instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No parser or query is available for the language (init failed)
    ParserUnavailable(LanguageId),
    /// tree-sitter returned no tree
    ParseFailed(LanguageId),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::ParserUnavailable(lang) => {
                write!(f, "no parser available for {}", lang.display_name())
            }
            EngineError::ParseFailed(lang) => {
                write!(f, "parse failed for {}", lang.display_name())
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Cached parse of the previous request (enables incremental parsing)
struct CachedParse {
    /// The language this tree was parsed with
    language: LanguageId,
    /// The parsed tree
    tree: Tree,
    /// The source text that was parsed (needed for computing edits)
    source: String,
}

/// Convert a byte offset to a tree-sitter Point (row, column in bytes)
fn byte_to_point(text: &str, byte_offset: usize) -> Point {
    let mut row = 0usize;
    let mut col = 0usize;

    for &byte in text.as_bytes().iter().take(byte_offset) {
        if byte == b'\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }

    Point { row, column: col }
}

/// Compute an InputEdit by diffing old and new source text.
/// Returns None if the sources are identical.
fn compute_incremental_edit(old_src: &str, new_src: &str) -> Option<InputEdit> {
    if old_src == new_src {
        return None;
    }

    let old_bytes = old_src.as_bytes();
    let new_bytes = new_src.as_bytes();

    // Common prefix length (in bytes)
    let mut start = 0;
    let max_start = old_bytes.len().min(new_bytes.len());
    while start < max_start && old_bytes[start] == new_bytes[start] {
        start += 1;
    }

    // Common suffix length (in bytes), not overlapping the prefix
    let mut old_end = old_bytes.len();
    let mut new_end = new_bytes.len();
    while old_end > start && new_end > start && old_bytes[old_end - 1] == new_bytes[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }

    Some(InputEdit {
        start_byte: start,
        old_end_byte: old_end,
        new_end_byte: new_end,
        start_position: byte_to_point(old_src, start),
        old_end_position: byte_to_point(old_src, old_end),
        new_end_position: byte_to_point(new_src, new_end),
    })
}

/// Convert a byte column to a character column on a given line.
/// Tree-sitter positions are in bytes; the renderer slices by chars.
fn byte_to_char_col(line: &str, byte_col: usize) -> usize {
    let byte_col = byte_col.min(line.len());
    let mut valid_byte = byte_col;
    while valid_byte > 0 && !line.is_char_boundary(valid_byte) {
        valid_byte -= 1;
    }
    line[..valid_byte].chars().count()
}

/// Parsers, queries and the single-slot parse cache
pub struct HighlightEngine {
    /// Parser instances per language
    parsers: HashMap<LanguageId, Parser>,
    /// Compiled highlight queries per language
    queries: HashMap<LanguageId, Query>,
    /// Last parse, reused incrementally for snippet revisions
    cache: Option<CachedParse>,
}

/// Languages the engine initializes. Each grammar crate bundles its own
/// highlight query, so no query files ship with this crate.
const ENGINE_LANGUAGES: &[LanguageId] = &[
    LanguageId::Rust,
    LanguageId::JavaScript,
    LanguageId::Python,
    LanguageId::Go,
    LanguageId::C,
    LanguageId::Cpp,
    LanguageId::Java,
    LanguageId::Bash,
    LanguageId::Php,
    LanguageId::Json,
    LanguageId::Html,
    LanguageId::Css,
];

impl HighlightEngine {
    /// Create an engine with all supported languages initialized
    pub fn new() -> Self {
        let mut engine = Self {
            parsers: HashMap::new(),
            queries: HashMap::new(),
            cache: None,
        };

        for &lang in ENGINE_LANGUAGES {
            engine.init_language(lang);
        }

        engine
    }

    /// Initialize a language's parser and query
    fn init_language(&mut self, lang: LanguageId) {
        let (ts_lang, highlights_scm): (tree_sitter::Language, &str) = match lang {
            LanguageId::Rust => (
                tree_sitter_rust::LANGUAGE.into(),
                tree_sitter_rust::HIGHLIGHTS_QUERY,
            ),
            LanguageId::JavaScript => (
                tree_sitter_javascript::LANGUAGE.into(),
                tree_sitter_javascript::HIGHLIGHT_QUERY,
            ),
            LanguageId::Python => (
                tree_sitter_python::LANGUAGE.into(),
                tree_sitter_python::HIGHLIGHTS_QUERY,
            ),
            LanguageId::Go => (
                tree_sitter_go::LANGUAGE.into(),
                tree_sitter_go::HIGHLIGHTS_QUERY,
            ),
            LanguageId::C => (tree_sitter_c::LANGUAGE.into(), tree_sitter_c::HIGHLIGHT_QUERY),
            LanguageId::Cpp => (
                tree_sitter_cpp::LANGUAGE.into(),
                tree_sitter_cpp::HIGHLIGHT_QUERY,
            ),
            LanguageId::Java => (
                tree_sitter_java::LANGUAGE.into(),
                tree_sitter_java::HIGHLIGHTS_QUERY,
            ),
            LanguageId::Bash => (
                tree_sitter_bash::LANGUAGE.into(),
                tree_sitter_bash::HIGHLIGHT_QUERY,
            ),
            LanguageId::Php => (
                tree_sitter_php::LANGUAGE_PHP.into(),
                tree_sitter_php::HIGHLIGHTS_QUERY,
            ),
            LanguageId::Json => (
                tree_sitter_json::LANGUAGE.into(),
                tree_sitter_json::HIGHLIGHTS_QUERY,
            ),
            LanguageId::Html => (
                tree_sitter_html::LANGUAGE.into(),
                tree_sitter_html::HIGHLIGHTS_QUERY,
            ),
            LanguageId::Css => (
                tree_sitter_css::LANGUAGE.into(),
                tree_sitter_css::HIGHLIGHTS_QUERY,
            ),
            // No parser for plain text
            LanguageId::PlainText => return,
        };

        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&ts_lang) {
            tracing::error!("Failed to set language for {:?}: {}", lang, e);
            return;
        }

        // Query compilation can fail if a grammar and its bundled query
        // drift apart; the language then degrades to plain rendering.
        match Query::new(&ts_lang, highlights_scm) {
            Ok(query) => {
                self.parsers.insert(lang, parser);
                self.queries.insert(lang, query);
            }
            Err(e) => {
                tracing::error!("Failed to compile query for {:?}: {:?}", lang, e);
            }
        }
    }

    /// True if the engine can actually highlight this language
    pub fn supports(&self, lang: LanguageId) -> bool {
        self.queries.contains_key(&lang)
    }

    /// Parse snippet text and extract highlights.
    /// Reuses the previous tree incrementally when the snippet is a
    /// revision in the same language.
    pub fn highlight(
        &mut self,
        source: &str,
        language: LanguageId,
    ) -> Result<SyntaxHighlights, EngineError> {
        if language == LanguageId::PlainText {
            return Ok(SyntaxHighlights::new(language));
        }

        let parser = self
            .parsers
            .get_mut(&language)
            .ok_or(EngineError::ParserUnavailable(language))?;

        let old_tree = match self.cache.take() {
            Some(mut cached) if cached.language == language => {
                match compute_incremental_edit(&cached.source, source) {
                    Some(edit) => {
                        tracing::trace!(
                            "Incremental parse: bytes {}..{} -> {}..{}",
                            edit.start_byte,
                            edit.old_end_byte,
                            edit.start_byte,
                            edit.new_end_byte
                        );
                        cached.tree.edit(&edit);
                        Some(cached.tree)
                    }
                    // Source unchanged, re-extract from the cached tree
                    None => Some(cached.tree),
                }
            }
            Some(cached) => {
                tracing::debug!(
                    "Language changed from {:?} to {:?}, full parse",
                    cached.language,
                    language
                );
                None
            }
            None => None,
        };

        let tree = parser
            .parse(source, old_tree.as_ref())
            .ok_or(EngineError::ParseFailed(language))?;

        self.cache = Some(CachedParse {
            language,
            tree: tree.clone(),
            source: source.to_owned(),
        });

        Ok(self.extract_highlights(source, &tree, language))
    }

    /// Extract highlight tokens from a parsed tree
    fn extract_highlights(
        &self,
        source: &str,
        tree: &Tree,
        language: LanguageId,
    ) -> SyntaxHighlights {
        let query = match self.queries.get(&language) {
            Some(q) => q,
            None => return SyntaxHighlights::new(language),
        };

        let mut highlights = SyntaxHighlights::new(language);
        let mut cursor = QueryCursor::new();
        let source_bytes = source.as_bytes();

        // Pre-split for byte->char column conversion
        let lines: Vec<&str> = source.lines().collect();

        let mut captures = cursor.captures(query, tree.root_node(), source_bytes);
        while let Some((query_match, capture_idx)) = captures.next() {
            let capture = &query_match.captures[*capture_idx];
            let capture_name = &query.capture_names()[capture.index as usize];

            let highlight_id = match highlight_id_for_name(capture_name) {
                Some(id) => id,
                None => continue, // Skip unknown captures
            };

            let node = capture.node;
            let start = node.start_position();
            let end = node.end_position();

            if start.row == end.row {
                // Single line token
                let line = lines.get(start.row).copied().unwrap_or("");
                let start_char = byte_to_char_col(line, start.column);
                let end_char = byte_to_char_col(line, end.column);

                if start_char < end_char {
                    let line_highlights = highlights.lines.entry(start.row).or_default();
                    line_highlights.tokens.push(HighlightToken {
                        start_col: start_char,
                        end_col: end_char,
                        highlight: highlight_id,
                    });
                }
            } else {
                // Multi-line token: split across lines
                for row in start.row..=end.row {
                    let line = lines.get(row).copied().unwrap_or("");
                    let line_char_len = line.chars().count();

                    let (start_char, end_char) = if row == start.row {
                        (byte_to_char_col(line, start.column), line_char_len)
                    } else if row == end.row {
                        (0, byte_to_char_col(line, end.column))
                    } else {
                        (0, line_char_len)
                    };

                    if start_char < end_char {
                        let line_highlights = highlights.lines.entry(row).or_default();
                        line_highlights.tokens.push(HighlightToken {
                            start_col: start_char,
                            end_col: end_char,
                            highlight: highlight_id,
                        });
                    }
                }
            }
        }

        // Sort tokens within each line by start column
        for line_highlights in highlights.lines.values_mut() {
            line_highlights
                .tokens
                .sort_by_key(|t| (t.start_col, t.end_col));
        }

        highlights
    }
}

impl Default for HighlightEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_highlighting() {
        let mut engine = HighlightEngine::new();
        let source = "fn main() {\n    let x = 42;\n    println!(\"hi\");\n}\n";
        let highlights = engine.highlight(source, LanguageId::Rust).unwrap();

        assert_eq!(highlights.language, LanguageId::Rust);
        assert!(highlights.token_count() > 0);
        // `fn` on line 0 should carry a token
        assert!(!highlights.line_tokens(0).is_empty());
    }

    #[test]
    fn test_plain_text_no_tokens() {
        let mut engine = HighlightEngine::new();
        let highlights = engine.highlight("Hello, world!", LanguageId::PlainText).unwrap();

        assert_eq!(highlights.language, LanguageId::PlainText);
        assert!(highlights.lines.is_empty());
    }

    #[test]
    fn test_tokens_sorted_per_line() {
        let mut engine = HighlightEngine::new();
        let source = "let a = foo(1, \"two\", bar);\n";
        let highlights = engine.highlight(source, LanguageId::JavaScript).unwrap();

        for lh in highlights.lines.values() {
            for pair in lh.tokens.windows(2) {
                assert!(pair[0].start_col <= pair[1].start_col);
            }
        }
    }

    #[test]
    fn test_all_bundled_queries_compile() {
        let engine = HighlightEngine::new();
        for &lang in ENGINE_LANGUAGES {
            assert!(
                engine.supports(lang),
                "Query failed to compile for {:?}",
                lang
            );
        }
    }

    #[test]
    fn test_incremental_revision_matches_full_parse() {
        let v1 = "fn main() {\n    let x = 1;\n}\n";
        let v2 = "fn main() {\n    let x = 1;\n    let y = 2;\n}\n";

        let mut incremental = HighlightEngine::new();
        incremental.highlight(v1, LanguageId::Rust).unwrap();
        let via_edit = incremental.highlight(v2, LanguageId::Rust).unwrap();

        let mut fresh = HighlightEngine::new();
        let via_full = fresh.highlight(v2, LanguageId::Rust).unwrap();

        assert_eq!(via_edit.token_count(), via_full.token_count());
        for (line, lh) in &via_full.lines {
            assert_eq!(via_edit.line_tokens(*line), lh.tokens.as_slice());
        }
    }

    #[test]
    fn test_language_switch_discards_cache() {
        let mut engine = HighlightEngine::new();
        engine.highlight("fn main() {}\n", LanguageId::Rust).unwrap();
        let highlights = engine
            .highlight("def main():\n    pass\n", LanguageId::Python)
            .unwrap();
        assert_eq!(highlights.language, LanguageId::Python);
        assert!(highlights.token_count() > 0);
    }

    #[test]
    fn test_multibyte_columns() {
        // String containing multibyte characters; columns are chars
        let mut engine = HighlightEngine::new();
        let source = "let s = \"héllo wörld\";\n";
        let highlights = engine.highlight(source, LanguageId::JavaScript).unwrap();

        let line_len = source.lines().next().unwrap().chars().count();
        for token in highlights.line_tokens(0) {
            assert!(token.end_col <= line_len);
        }
    }

    #[test]
    fn test_compute_incremental_edit() {
        assert!(compute_incremental_edit("same", "same").is_none());

        let edit = compute_incremental_edit("abc", "abXc").unwrap();
        assert_eq!(edit.start_byte, 2);
        assert_eq!(edit.old_end_byte, 2);
        assert_eq!(edit.new_end_byte, 3);
    }
}
