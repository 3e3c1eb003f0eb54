//! Structural HTML and embedded-stylesheet validation.
//!
//! Structural validity means the document parses under a strict HTML5
//! parser without recorded errors; it does not imply visual correctness.
//! CSS inside `<style>` blocks is parsed in error-recovery mode and every
//! recovered error is captured through the parser's warning collector —
//! parser failures never escape as panics or errors.

use std::sync::{Arc, RwLock};

use lightningcss::error::{Error as CssError, ParserError};
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static STYLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("style").expect("Failed to parse style selector"));

/// Runs one validation pass over a document and returns the error strings.
/// An empty report means the document is structurally valid.
pub fn validate_document(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut errors: Vec<String> = document
        .errors
        .iter()
        .map(|e| format!("HTML parse error: {e}"))
        .collect();

    for style in document.select(&STYLE_SELECTOR) {
        let css: String = style.text().collect();
        if css.trim().is_empty() {
            continue;
        }
        errors.extend(validate_stylesheet(&css));
    }

    errors
}

/// Validates one stylesheet. Recoverable errors are collected via the
/// warning hook; a hard parse failure becomes a single error string.
fn validate_stylesheet(css: &str) -> Vec<String> {
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        error_recovery: true,
        warnings: Some(warnings.clone()),
        ..ParserOptions::default()
    };

    let mut out = Vec::new();
    if let Err(e) = StyleSheet::parse(css, options) {
        out.push(format_css_error(&e));
    }
    if let Ok(collected) = warnings.read() {
        out.extend(collected.iter().map(format_css_error));
    }
    out
}

fn format_css_error(err: &CssError<ParserError>) -> String {
    match &err.loc {
        Some(loc) => format!(
            "CSS error in <style> block: {} (line {}, column {})",
            err.kind, loc.line, loc.column
        ),
        None => format!("CSS error in <style> block: {}", err.kind),
    }
}
