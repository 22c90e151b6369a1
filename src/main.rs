use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;

use pastelit::cli::CliArgs;
use pastelit::{HighlightBridge, HighlightConfig, LanguageId};

fn main() -> Result<()> {
    pastelit::tracing::init();

    let args = CliArgs::parse();

    let mut config = HighlightConfig::load();
    if let Some(ms) = args.timeout_ms {
        config.timeout_ms = ms;
    }

    let content = match &args.path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let hint = args
        .resolve_language()
        .map_err(anyhow::Error::msg)?
        .or_else(|| config.default_language());

    if args.detect_only {
        let language = hint.unwrap_or_else(|| LanguageId::detect(&content));
        println!("{}", language.name());
        return Ok(());
    }

    let bridge = HighlightBridge::spawn(config);
    let result = bridge.highlight(&content, hint);

    tracing::info!(
        "Rendered {} lines as {} ({})",
        result.lines.len(),
        result.language.name(),
        if result.origin.is_fallback() {
            "fallback"
        } else {
            "parsed"
        }
    );

    if args.wrap {
        println!(r#"<pre class="snippet" data-language="{}">"#, result.language.name());
    }
    for line in &result.lines {
        println!("{}", line.html);
    }
    if args.wrap {
        println!("</pre>");
    }

    Ok(())
}
