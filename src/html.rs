//! Per-line HTML rendering
//!
//! Turns snippet text plus extracted highlight tokens into the structured
//! per-line HTML the viewer consumes. Every line renders as
//! `<span class="line">…</span>`; highlighted runs become nested spans
//! whose class is derived from the capture name (`keyword.function` →
//! `hl-keyword-function`). The same module provides the escaped plain
//! rendering used for plain text and for every fallback path.
//!
//! Lines are split on `\n`, so text ending in a newline yields a trailing
//! empty line — the viewer counts lines the same way.

use crate::syntax::{HighlightId, HighlightToken, SyntaxHighlights, HIGHLIGHT_NAMES};

/// One rendered line, ready for the viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedLine {
    /// Line number (1-indexed)
    pub number: usize,
    /// HTML for the line, always wrapped in `<span class="line">`
    pub html: String,
}

/// Escape text for HTML: `&`, `<`, `>`
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// CSS class for a highlight ID: capture name with dots as dashes
pub fn class_name(id: HighlightId) -> String {
    let name = HIGHLIGHT_NAMES
        .get(id as usize)
        .copied()
        .unwrap_or("variable");
    format!("hl-{}", name.replace('.', "-"))
}

/// First covering token wins when tokens overlap (same rule the
/// column lookup in LineHighlights uses).
fn covering_highlight(tokens: &[HighlightToken], col: usize) -> Option<HighlightId> {
    for token in tokens {
        if col >= token.start_col && col < token.end_col {
            return Some(token.highlight);
        }
        if token.start_col > col {
            break;
        }
    }
    None
}

/// Render one line's content into a `<span class="line">` wrapper
fn render_line(line: &str, tokens: &[HighlightToken]) -> String {
    if line.is_empty() {
        return r#"<span class="line"></span>"#.to_string();
    }

    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len() + 32);
    out.push_str(r#"<span class="line">"#);

    let mut col = 0;
    while col < chars.len() {
        let highlight = covering_highlight(tokens, col);

        // Extend the run while the highlight stays the same
        let mut end = col + 1;
        while end < chars.len() && covering_highlight(tokens, end) == highlight {
            end += 1;
        }

        let text: String = chars[col..end].iter().collect();
        match highlight {
            Some(id) => {
                out.push_str(&format!(
                    r#"<span class="{}">{}</span>"#,
                    class_name(id),
                    escape(&text)
                ));
            }
            None => out.push_str(&escape(&text)),
        }

        col = end;
    }

    out.push_str("</span>");
    out
}

/// Render all lines of a snippet using extracted highlights
pub fn render_lines(source: &str, highlights: &SyntaxHighlights) -> Vec<HighlightedLine> {
    source
        .split('\n')
        .enumerate()
        .map(|(i, line)| HighlightedLine {
            number: i + 1,
            html: render_line(line, highlights.line_tokens(i)),
        })
        .collect()
}

/// Escaped plain rendering: plain text snippets and all fallbacks
pub fn plain_lines(source: &str) -> Vec<HighlightedLine> {
    source
        .split('\n')
        .enumerate()
        .map(|(i, line)| HighlightedLine {
            number: i + 1,
            html: if line.is_empty() {
                r#"<span class="line"></span>"#.to_string()
            } else {
                format!(r#"<span class="line">{}</span>"#, escape(line))
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{LanguageId, LineHighlights};

    #[test]
    fn test_escape() {
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_class_name() {
        let keyword = crate::syntax::highlight_id_for_name("keyword").unwrap();
        assert_eq!(class_name(keyword), "hl-keyword");

        let kw_fn = crate::syntax::highlight_id_for_name("keyword.function").unwrap();
        assert_eq!(class_name(kw_fn), "hl-keyword-function");
    }

    #[test]
    fn test_plain_lines() {
        let lines = plain_lines("one\n\n<b>three</b>");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[0].html, r#"<span class="line">one</span>"#);
        assert_eq!(lines[1].html, r#"<span class="line"></span>"#);
        assert_eq!(
            lines[2].html,
            r#"<span class="line">&lt;b&gt;three&lt;/b&gt;</span>"#
        );
    }

    #[test]
    fn test_trailing_newline_yields_empty_line() {
        let lines = plain_lines("a\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].html, r#"<span class="line"></span>"#);
    }

    #[test]
    fn test_empty_content_is_one_empty_line() {
        let lines = plain_lines("");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[0].html, r#"<span class="line"></span>"#);
    }

    fn highlights_with_line(line: usize, tokens: Vec<HighlightToken>) -> SyntaxHighlights {
        let mut hl = SyntaxHighlights::new(LanguageId::Rust);
        hl.lines.insert(line, LineHighlights { tokens });
        hl
    }

    #[test]
    fn test_render_tokens() {
        let keyword = crate::syntax::highlight_id_for_name("keyword").unwrap();
        let hl = highlights_with_line(
            0,
            vec![HighlightToken {
                start_col: 0,
                end_col: 2,
                highlight: keyword,
            }],
        );

        let lines = render_lines("fn main()", &hl);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].html,
            r#"<span class="line"><span class="hl-keyword">fn</span> main()</span>"#
        );
    }

    #[test]
    fn test_render_escapes_inside_tokens() {
        let string_id = crate::syntax::highlight_id_for_name("string").unwrap();
        let hl = highlights_with_line(
            0,
            vec![HighlightToken {
                start_col: 0,
                end_col: 5,
                highlight: string_id,
            }],
        );

        let lines = render_lines("\"<&>\"", &hl);
        assert_eq!(
            lines[0].html,
            r#"<span class="line"><span class="hl-string">"&lt;&amp;&gt;"</span></span>"#
        );
    }

    #[test]
    fn test_overlap_first_token_wins() {
        let keyword = crate::syntax::highlight_id_for_name("keyword").unwrap();
        let string_id = crate::syntax::highlight_id_for_name("string").unwrap();
        let hl = highlights_with_line(
            0,
            vec![
                HighlightToken {
                    start_col: 0,
                    end_col: 4,
                    highlight: keyword,
                },
                HighlightToken {
                    start_col: 2,
                    end_col: 6,
                    highlight: string_id,
                },
            ],
        );

        let lines = render_lines("abcdef", &hl);
        assert_eq!(
            lines[0].html,
            r#"<span class="line"><span class="hl-keyword">abcd</span><span class="hl-string">ef</span></span>"#
        );
    }

    #[test]
    fn test_lines_without_tokens_render_bare() {
        let hl = SyntaxHighlights::new(LanguageId::Rust);
        let lines = render_lines("first\nsecond", &hl);
        assert_eq!(lines[0].html, r#"<span class="line">first</span>"#);
        assert_eq!(lines[1].html, r#"<span class="line">second</span>"#);
    }
}
