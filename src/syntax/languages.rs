//! Language identification and detection
//!
//! Maps caller-supplied language hints to language IDs and guesses the
//! language of pasted text from its content. Snippets arrive as bare
//! strings with no filename, so detection works on the text itself:
//! shebang line first, then document markers, then a strict JSON probe,
//! then weighted keyword scoring.

/// Supported language identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageId {
    #[default]
    PlainText,
    Rust,
    JavaScript,
    Python,
    Go,
    C,
    Cpp,
    Java,
    Bash,
    Php,
    Json,
    Html,
    Css,
}

/// Minimum weighted score before keyword detection trusts its guess.
/// Below this the snippet renders as plain text.
const DETECT_MIN_SCORE: u32 = 3;

/// Per-marker occurrence cap so one repeated token cannot dominate.
const DETECT_MARKER_CAP: u32 = 5;

/// Weighted content markers per language, used by [`LanguageId::detect`].
/// Weights are rough distinctiveness: `::` appears in Rust, C++ and PHP,
/// `fmt.` practically only in Go.
const MARKERS: &[(LanguageId, &[(&str, u32)])] = &[
    (
        LanguageId::Rust,
        &[
            ("fn ", 2),
            ("let mut ", 3),
            ("impl ", 3),
            ("pub fn ", 3),
            ("println!", 3),
            ("use std", 3),
            ("&str", 2),
            ("match ", 1),
            ("::", 1),
            ("->", 1),
        ],
    ),
    (
        LanguageId::JavaScript,
        &[
            ("function ", 2),
            ("=> ", 2),
            ("console.log", 3),
            ("===", 2),
            ("export ", 2),
            ("const ", 1),
            ("let ", 1),
            ("var ", 1),
            ("this.", 1),
        ],
    ),
    (
        LanguageId::Python,
        &[
            ("def ", 3),
            ("elif ", 3),
            ("lambda ", 3),
            ("__init__", 3),
            ("None", 2),
            ("print(", 2),
            ("import ", 1),
            ("self.", 1),
        ],
    ),
    (
        LanguageId::Go,
        &[
            ("func ", 3),
            ("fmt.", 3),
            ("go func", 3),
            ("defer ", 3),
            (":=", 2),
            ("package ", 2),
            ("chan ", 2),
            ("nil", 1),
        ],
    ),
    (
        LanguageId::C,
        &[
            ("#include", 3),
            ("malloc", 3),
            ("printf", 2),
            ("int main", 2),
            ("char *", 2),
            ("void ", 1),
            ("->", 1),
        ],
    ),
    (
        LanguageId::Cpp,
        &[
            ("std::", 3),
            ("cout", 3),
            ("nullptr", 3),
            ("#include", 2),
            ("template", 2),
            ("namespace ", 2),
            ("::", 1),
        ],
    ),
    (
        LanguageId::Java,
        &[
            ("public class", 3),
            ("System.out", 3),
            ("public static void", 3),
            ("@Override", 3),
            ("extends ", 2),
            ("private ", 1),
        ],
    ),
    (
        LanguageId::Bash,
        &[
            ("esac", 3),
            ("if [", 3),
            ("fi\n", 3),
            ("echo ", 2),
            ("done", 2),
            ("$((", 2),
            ("then", 1),
        ],
    ),
    (
        LanguageId::Php,
        &[
            ("<?php", 3),
            ("$this->", 3),
            ("function ", 1),
            ("echo ", 1),
            ("=>", 1),
        ],
    ),
    (
        LanguageId::Html,
        &[
            ("</div>", 3),
            ("<span", 2),
            ("<p>", 2),
            ("href=", 2),
            ("<br", 2),
            ("class=", 1),
        ],
    ),
    (
        LanguageId::Css,
        &[
            ("color:", 3),
            ("display:", 3),
            (":hover", 3),
            ("@media", 3),
            ("px;", 2),
            ("margin", 2),
        ],
    ),
];

impl LanguageId {
    /// Resolve a caller-supplied language hint (e.g. "rust", "js", "c++").
    /// Returns None for hints we do not recognize.
    pub fn from_name(name: &str) -> Option<Self> {
        let id = match name.to_lowercase().as_str() {
            "text" | "txt" | "plain" | "plaintext" => LanguageId::PlainText,
            "rust" | "rs" => LanguageId::Rust,
            "javascript" | "js" | "jsx" | "mjs" => LanguageId::JavaScript,
            "python" | "py" => LanguageId::Python,
            "go" | "golang" => LanguageId::Go,
            "c" => LanguageId::C,
            "cpp" | "c++" | "cxx" | "cc" => LanguageId::Cpp,
            "java" => LanguageId::Java,
            "bash" | "sh" | "shell" | "zsh" => LanguageId::Bash,
            "php" => LanguageId::Php,
            "json" => LanguageId::Json,
            "html" | "htm" => LanguageId::Html,
            "css" => LanguageId::Css,
            _ => return None,
        };
        Some(id)
    }

    /// Guess the language from snippet content.
    pub fn detect(source: &str) -> Self {
        let trimmed = source.trim_start();
        if trimmed.is_empty() {
            return LanguageId::PlainText;
        }

        if let Some(lang) = detect_from_shebang(source) {
            return lang;
        }

        if trimmed.starts_with("<?php") {
            return LanguageId::Php;
        }

        let lower_head: String = trimmed.chars().take(64).collect::<String>().to_lowercase();
        if lower_head.starts_with("<!doctype") || lower_head.starts_with("<html") {
            return LanguageId::Html;
        }

        // Strict JSON probe: structural start plus a full parse
        if (trimmed.starts_with('{') || trimmed.starts_with('['))
            && serde_json::from_str::<serde_json::Value>(source).is_ok()
        {
            return LanguageId::Json;
        }

        let mut best = LanguageId::PlainText;
        let mut best_score = 0u32;
        for (lang, markers) in MARKERS {
            let mut score = 0u32;
            for (marker, weight) in *markers {
                let hits = source.matches(marker).count() as u32;
                score += hits.min(DETECT_MARKER_CAP) * weight;
            }
            if score > best_score {
                best = *lang;
                best_score = score;
            }
        }

        if best_score >= DETECT_MIN_SCORE {
            tracing::debug!("Detected {:?} (score {})", best, best_score);
            best
        } else {
            LanguageId::PlainText
        }
    }

    /// Get display name for the language
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageId::PlainText => "Plain Text",
            LanguageId::Rust => "Rust",
            LanguageId::JavaScript => "JavaScript",
            LanguageId::Python => "Python",
            LanguageId::Go => "Go",
            LanguageId::C => "C",
            LanguageId::Cpp => "C++",
            LanguageId::Java => "Java",
            LanguageId::Bash => "Bash",
            LanguageId::Php => "PHP",
            LanguageId::Json => "JSON",
            LanguageId::Html => "HTML",
            LanguageId::Css => "CSS",
        }
    }

    /// Stable lowercase identifier (CLI output, CSS-friendly)
    pub fn name(&self) -> &'static str {
        match self {
            LanguageId::PlainText => "text",
            LanguageId::Rust => "rust",
            LanguageId::JavaScript => "javascript",
            LanguageId::Python => "python",
            LanguageId::Go => "go",
            LanguageId::C => "c",
            LanguageId::Cpp => "cpp",
            LanguageId::Java => "java",
            LanguageId::Bash => "bash",
            LanguageId::Php => "php",
            LanguageId::Json => "json",
            LanguageId::Html => "html",
            LanguageId::Css => "css",
        }
    }

    /// Check if this language has syntax highlighting support
    pub fn has_highlighting(&self) -> bool {
        !matches!(self, LanguageId::PlainText)
    }
}

/// Map a `#!` first line to a language, if present.
fn detect_from_shebang(source: &str) -> Option<LanguageId> {
    let first_line = source.lines().next()?;
    if !first_line.starts_with("#!") {
        return None;
    }
    if first_line.contains("python") {
        Some(LanguageId::Python)
    } else if first_line.contains("node") {
        Some(LanguageId::JavaScript)
    } else if first_line.contains("php") {
        Some(LanguageId::Php)
    } else if first_line.contains("bash")
        || first_line.contains("zsh")
        || first_line.ends_with("sh")
    {
        Some(LanguageId::Bash)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(LanguageId::from_name("rust"), Some(LanguageId::Rust));
        assert_eq!(LanguageId::from_name("RS"), Some(LanguageId::Rust));
        assert_eq!(LanguageId::from_name("js"), Some(LanguageId::JavaScript));
        assert_eq!(LanguageId::from_name("c++"), Some(LanguageId::Cpp));
        assert_eq!(LanguageId::from_name("text"), Some(LanguageId::PlainText));
        assert_eq!(LanguageId::from_name("brainfuck"), None);
    }

    #[test]
    fn test_detect_rust() {
        let src = r#"
pub fn add(a: u32, b: u32) -> u32 {
    let mut total = a;
    total += b;
    println!("{}", total);
    total
}
"#;
        assert_eq!(LanguageId::detect(src), LanguageId::Rust);
    }

    #[test]
    fn test_detect_python() {
        let src =
            "def greet(name):\n    if name is None:\n        return\n    print(f\"hi {name}\")\n";
        assert_eq!(LanguageId::detect(src), LanguageId::Python);
    }

    #[test]
    fn test_detect_go() {
        let src = "package main\n\nfunc main() {\n\tx := 1\n\tfmt.Println(x)\n}\n";
        assert_eq!(LanguageId::detect(src), LanguageId::Go);
    }

    #[test]
    fn test_detect_json() {
        assert_eq!(
            LanguageId::detect(r#"{"name": "demo", "tags": [1, 2]}"#),
            LanguageId::Json
        );
        // Structural start but invalid JSON falls through to scoring
        assert_ne!(LanguageId::detect("{not json at all"), LanguageId::Json);
    }

    #[test]
    fn test_detect_shebang() {
        assert_eq!(
            LanguageId::detect("#!/usr/bin/env python3\nprint('x')\n"),
            LanguageId::Python
        );
        assert_eq!(LanguageId::detect("#!/bin/bash\necho hi\n"), LanguageId::Bash);
        assert_eq!(
            LanguageId::detect("#!/usr/bin/env node\nconsole.log(1)\n"),
            LanguageId::JavaScript
        );
    }

    #[test]
    fn test_detect_markers() {
        assert_eq!(LanguageId::detect("<?php\necho \"hi\";\n"), LanguageId::Php);
        assert_eq!(
            LanguageId::detect("<!DOCTYPE html>\n<html><body></body></html>"),
            LanguageId::Html
        );
    }

    #[test]
    fn test_detect_plain() {
        assert_eq!(LanguageId::detect(""), LanguageId::PlainText);
        assert_eq!(LanguageId::detect("   \n  "), LanguageId::PlainText);
        assert_eq!(
            LanguageId::detect("just some prose about nothing in particular"),
            LanguageId::PlainText
        );
    }

    #[test]
    fn test_display_and_stable_names() {
        assert_eq!(LanguageId::Cpp.display_name(), "C++");
        assert_eq!(LanguageId::Cpp.name(), "cpp");
        assert!(!LanguageId::PlainText.has_highlighting());
        assert!(LanguageId::Json.has_highlighting());
    }
}
