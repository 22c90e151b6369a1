//! Syntax highlighting data structures
//!
//! Defines highlight tokens, per-line token lists, and the snippet-level
//! highlight result handed from the engine to the HTML renderer.

use std::collections::HashMap;

use super::languages::LanguageId;

/// Standard tree-sitter capture names recognized by the renderer.
/// Index into this array is the HighlightId; the renderer derives the
/// CSS class from the name (dots become dashes).
pub const HIGHLIGHT_NAMES: &[&str] = &[
    "attribute",             // @attribute
    "boolean",               // @boolean (true, false)
    "comment",               // @comment
    "constant",              // @constant
    "constant.builtin",      // @constant.builtin (null, nil)
    "constructor",           // @constructor (new Foo)
    "escape",                // @escape (string escapes)
    "function",              // @function
    "function.builtin",      // @function.builtin (echo, print)
    "function.method",       // @function.method
    "keyword",               // @keyword
    "keyword.return",        // @keyword.return
    "keyword.function",      // @keyword.function (function, fn)
    "keyword.operator",      // @keyword.operator (and, or)
    "label",                 // @label
    "number",                // @number
    "operator",              // @operator
    "property",              // @property
    "punctuation",           // @punctuation (general)
    "punctuation.bracket",   // @punctuation.bracket
    "punctuation.delimiter", // @punctuation.delimiter
    "punctuation.special",   // @punctuation.special
    "string",                // @string
    "string.special",        // @string.special (regex, heredoc)
    "tag",                   // @tag (HTML tags)
    "tag.attribute",         // @tag.attribute
    "type",                  // @type
    "type.builtin",          // @type.builtin (int, string, bool)
    "variable",              // @variable
    "variable.builtin",      // @variable.builtin ($this, self)
    "variable.parameter",    // @variable.parameter
];

/// Index into HIGHLIGHT_NAMES
pub type HighlightId = u16;

/// A single highlighted span within a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightToken {
    /// Start column in characters (0-indexed, inclusive)
    pub start_col: usize,
    /// End column (exclusive)
    pub end_col: usize,
    /// Index into HIGHLIGHT_NAMES
    pub highlight: HighlightId,
}

/// Highlight information for a single line
#[derive(Debug, Clone, Default)]
pub struct LineHighlights {
    /// Tokens sorted by start_col
    pub tokens: Vec<HighlightToken>,
}

impl LineHighlights {
    /// Get the highlight ID covering a column, if any.
    /// When tokens overlap, the first covering token in sorted order wins.
    pub fn highlight_at(&self, col: usize) -> Option<HighlightId> {
        for token in &self.tokens {
            if col >= token.start_col && col < token.end_col {
                return Some(token.highlight);
            }
            if token.start_col > col {
                break; // tokens are sorted, no need to continue
            }
        }
        None
    }
}

/// Complete highlight result for one snippet
#[derive(Debug, Clone, Default)]
pub struct SyntaxHighlights {
    /// Map of line number (0-indexed) to tokens
    pub lines: HashMap<usize, LineHighlights>,
    /// Language the snippet was parsed as
    pub language: LanguageId,
}

impl SyntaxHighlights {
    /// Create new empty highlights for a language
    pub fn new(language: LanguageId) -> Self {
        Self {
            lines: HashMap::new(),
            language,
        }
    }

    /// Get highlight tokens for a line, or empty slice if none
    pub fn line_tokens(&self, line: usize) -> &[HighlightToken] {
        self.lines
            .get(&line)
            .map(|lh| lh.tokens.as_slice())
            .unwrap_or(&[])
    }

    /// Total token count across all lines
    pub fn token_count(&self) -> usize {
        self.lines.values().map(|lh| lh.tokens.len()).sum()
    }
}

/// Look up highlight ID by capture name
pub fn highlight_id_for_name(name: &str) -> Option<HighlightId> {
    // Handle hierarchical names: try exact match first, then progressively
    // shorter parents (e.g. "keyword.control.import" -> "keyword.control"
    // -> "keyword").
    let mut current = name;
    loop {
        if let Some(pos) = HIGHLIGHT_NAMES.iter().position(|&n| n == current) {
            return Some(pos as HighlightId);
        }

        let Some(dot_pos) = current.rfind('.') else {
            break;
        };
        current = &current[..dot_pos];
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_id_lookup() {
        assert!(highlight_id_for_name("keyword").is_some());
        assert!(highlight_id_for_name("keyword.function").is_some());
        assert!(highlight_id_for_name("keyword.control.import").is_some());
        assert!(highlight_id_for_name("string").is_some());
        assert!(highlight_id_for_name("nonexistent").is_none());
    }

    #[test]
    fn test_line_highlight_at() {
        let line = LineHighlights {
            tokens: vec![
                HighlightToken {
                    start_col: 0,
                    end_col: 5,
                    highlight: 1,
                },
                HighlightToken {
                    start_col: 10,
                    end_col: 15,
                    highlight: 2,
                },
            ],
        };

        assert_eq!(line.highlight_at(0), Some(1));
        assert_eq!(line.highlight_at(4), Some(1));
        assert_eq!(line.highlight_at(5), None);
        assert_eq!(line.highlight_at(10), Some(2));
        assert_eq!(line.highlight_at(14), Some(2));
        assert_eq!(line.highlight_at(15), None);
    }

    #[test]
    fn test_token_count() {
        let mut hl = SyntaxHighlights::new(LanguageId::Rust);
        hl.lines.insert(
            0,
            LineHighlights {
                tokens: vec![HighlightToken {
                    start_col: 0,
                    end_col: 2,
                    highlight: 0,
                }],
            },
        );
        hl.lines.insert(
            2,
            LineHighlights {
                tokens: vec![
                    HighlightToken {
                        start_col: 0,
                        end_col: 1,
                        highlight: 0,
                    },
                    HighlightToken {
                        start_col: 3,
                        end_col: 4,
                        highlight: 1,
                    },
                ],
            },
        );

        assert_eq!(hl.token_count(), 3);
        assert_eq!(hl.line_tokens(2).len(), 2);
        assert!(hl.line_tokens(1).is_empty());
    }
}
