//! Command-line argument parsing for the HTML renderer front
//!
//! Reads a snippet from a file or stdin and prints the highlighted
//! per-line HTML the viewer would receive.

use clap::Parser;
use std::path::PathBuf;

use crate::syntax::LanguageId;

/// Render a snippet as highlighted per-line HTML
#[derive(Parser, Debug)]
#[command(
    name = "pastelit",
    version,
    about = "Render a snippet as highlighted per-line HTML"
)]
pub struct CliArgs {
    /// File to read; stdin when omitted
    #[arg(value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Language hint (e.g. "rust", "js", "c++"); detected from content when omitted
    #[arg(short, long, value_name = "NAME")]
    pub language: Option<String>,

    /// Worker timeout in milliseconds before the plain fallback
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Wrap the lines in a <pre class="snippet"> block
    #[arg(long)]
    pub wrap: bool,

    /// Print the detected language name and exit
    #[arg(long)]
    pub detect_only: bool,
}

impl CliArgs {
    /// Resolve the --language hint, rejecting names we do not know
    pub fn resolve_language(&self) -> Result<Option<LanguageId>, String> {
        match &self.language {
            None => Ok(None),
            Some(name) => LanguageId::from_name(name)
                .map(Some)
                .ok_or_else(|| format!("Unknown language: {}", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_language() {
        let args = CliArgs::parse_from(["pastelit", "--language", "rust"]);
        assert_eq!(args.resolve_language(), Ok(Some(LanguageId::Rust)));

        let args = CliArgs::parse_from(["pastelit"]);
        assert_eq!(args.resolve_language(), Ok(None));

        let args = CliArgs::parse_from(["pastelit", "--language", "klingon"]);
        assert!(args.resolve_language().is_err());
    }

    #[test]
    fn test_flags() {
        let args = CliArgs::parse_from(["pastelit", "snippet.rs", "--wrap", "--timeout-ms", "250"]);
        assert_eq!(args.path, Some(PathBuf::from("snippet.rs")));
        assert!(args.wrap);
        assert_eq!(args.timeout_ms, Some(250));
        assert!(!args.detect_only);
    }
}
