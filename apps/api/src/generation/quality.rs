//! Quality Heuristics & Tweak Loop.
//!
//! A battery of coarse checks over a structurally valid document:
//! responsiveness, legibility, spacing, broken anchors, accessibility.
//! Each check either fires a feedback string or stays silent — no severity
//! scoring. The contrast and external-link checks are intentionally weak
//! pattern matches, kept advisory rather than upgraded to computed-style
//! analysis. Feedback drives at most one corrective model call; a tweak
//! that regresses structural validity is discarded.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::generation::prompts::{TWEAK_SYSTEM_TEMPLATE, TWEAK_USER};
use crate::generation::synthesis::extract_html;
use crate::llm_client::{ChatMessage, ChatModel};
use crate::progress::{report, StatusSink};
use crate::validation::validate_document;

/// Corrective iterations after the first analysis.
pub const MAX_TWEAK_ATTEMPTS: u32 = 1;

/// Base font sizes below this many pixels trigger a legibility suggestion.
const MIN_BODY_FONT_PX: u32 = 14;

static FONT_SIZE_INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"font-size:\s*(\d+)px").expect("invalid font-size regex"));
static BODY_FONT_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)body\s*\{[^}]*font-size:\s*(\d+)px").expect("invalid body rule regex")
});
static FG_COLOR_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"color:\s*([^;]+)").expect("invalid color regex"));
static BG_COLOR_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:background-color|background):\s*([^;]+)").expect("invalid background regex")
});

static STYLE_SEL: Lazy<Selector> = Lazy::new(|| sel("style"));
static VIEWPORT_SEL: Lazy<Selector> = Lazy::new(|| sel(r#"meta[name="viewport"]"#));
static BODY_SEL: Lazy<Selector> = Lazy::new(|| sel("body"));
static IMG_SEL: Lazy<Selector> = Lazy::new(|| sel("img"));
static H1_SEL: Lazy<Selector> = Lazy::new(|| sel("h1"));
static H2_SEL: Lazy<Selector> = Lazy::new(|| sel("h2"));
static P_SEL: Lazy<Selector> = Lazy::new(|| sel("p"));
static SECTION_SEL: Lazy<Selector> =
    Lazy::new(|| sel("header, footer, main, section, article, aside"));
static CARD_SEL: Lazy<Selector> = Lazy::new(|| sel(r#"[class*="card"]"#));
static CONTRAST_SAMPLE_SEL: Lazy<Selector> = Lazy::new(|| sel("p, span, li, a, h1, h2"));
static LINK_SEL: Lazy<Selector> = Lazy::new(|| sel("a[href]"));
static BUTTON_SEL: Lazy<Selector> = Lazy::new(|| sel("button"));
static ID_SEL: Lazy<Selector> = Lazy::new(|| sel("[id]"));

fn sel(raw: &str) -> Selector {
    Selector::parse(raw).expect("Failed to parse selector")
}

/// Runs every heuristic and returns the collected feedback strings.
pub fn analyze_quality(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let stylesheets: Vec<String> = document
        .select(&STYLE_SEL)
        .map(|s| s.text().collect())
        .collect();

    let mut feedback = Vec::new();
    check_viewport(&document, &mut feedback);
    check_base_font_size(&document, &stylesheets, &mut feedback);
    check_heading_differentiation(&document, &mut feedback);
    check_section_spacing(&document, &stylesheets, &mut feedback);
    check_images(&document, &mut feedback);
    check_contrast_sample(&document, &mut feedback);
    check_links(&document, &mut feedback);
    check_button_labels(&document, &mut feedback);
    feedback
}

fn check_viewport(document: &Html, feedback: &mut Vec<String>) {
    if document.select(&VIEWPORT_SEL).next().is_none() {
        feedback.push(
            "Visual: Add a viewport meta tag for responsiveness: \
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">."
                .to_string(),
        );
    }
}

/// Looks for a base font size first on the body's inline style, then with a
/// coarse pattern search over stylesheet text for a `body` rule.
fn check_base_font_size(document: &Html, stylesheets: &[String], feedback: &mut Vec<String>) {
    let inline = document
        .select(&BODY_SEL)
        .next()
        .and_then(|body| body.value().attr("style"))
        .and_then(font_size_px);

    let size = inline.or_else(|| {
        stylesheets.iter().find_map(|css| {
            BODY_FONT_RULE
                .captures(css)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        })
    });

    match size {
        Some(px) if px < MIN_BODY_FONT_PX => feedback.push(format!(
            "Visual: Base body font size ({px}px) seems small. \
             Consider increasing to 14-16px for readability."
        )),
        Some(_) => {}
        None => feedback.push(
            "Visual: Set an explicit base font-size on the body (e.g. 16px) \
             for consistent readability."
                .to_string(),
        ),
    }
}

fn font_size_px(style: &str) -> Option<u32> {
    FONT_SIZE_INLINE
        .captures(style)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Coarse reminder, not a computed-style check: fires whenever headings and
/// paragraphs coexist.
fn check_heading_differentiation(document: &Html, feedback: &mut Vec<String>) {
    let has_p = document.select(&P_SEL).next().is_some();
    if !has_p {
        return;
    }
    if document.select(&H1_SEL).next().is_some() {
        feedback.push(
            "Visual: Ensure <h1> headings are significantly larger than paragraph \
             text for clear visual hierarchy."
                .to_string(),
        );
    }
    if document.select(&H2_SEL).next().is_some() {
        feedback.push(
            "Visual: Ensure <h2> headings are noticeably larger than paragraph \
             text and distinct from <h1>."
                .to_string(),
        );
    }
}

/// Samples a few sections/cards and flags them when neither inline style
/// nor a best-effort stylesheet rule search mentions padding or margins.
fn check_section_spacing(document: &Html, stylesheets: &[String], feedback: &mut Vec<String>) {
    let candidates: Vec<ElementRef> = document
        .select(&SECTION_SEL)
        .chain(document.select(&CARD_SEL))
        .collect();
    if candidates.is_empty() {
        return;
    }

    let missing = candidates
        .iter()
        .take(3)
        .filter(|el| !has_spacing(el, stylesheets))
        .count();
    if missing > 1 {
        feedback.push(
            "Visual: Some key sections or blocks lack explicit padding/margins. \
             Review spacing."
                .to_string(),
        );
    }
}

fn has_spacing(el: &ElementRef, stylesheets: &[String]) -> bool {
    if let Some(style) = el.value().attr("style") {
        if style.contains("padding:") || style.contains("margin:") {
            return true;
        }
    }
    // Best-effort rule search: the stylesheet mentions a rule for this tag
    // or one of its classes, and declares spacing somewhere.
    let tag_rule = format!("{} {{", el.value().name());
    stylesheets.iter().any(|css| {
        let declares_spacing = css.contains("padding:") || css.contains("margin:");
        if !declares_spacing {
            return false;
        }
        css.contains(&tag_rule)
            || el
                .value()
                .classes()
                .any(|class| css.contains(&format!(".{class} {{")))
    })
}

fn check_images(document: &Html, feedback: &mut Vec<String>) {
    if document.select(&IMG_SEL).next().is_none() {
        feedback.push(
            "Visual: No images (<img> tags) found. Consider adding images or icons \
             for engagement."
                .to_string(),
        );
    }
}

/// Flags a sampled element whose inline foreground and background color
/// declarations are textually identical. Compares declaration text only,
/// never computed styles.
fn check_contrast_sample(document: &Html, feedback: &mut Vec<String>) {
    for el in document.select(&CONTRAST_SAMPLE_SEL).take(10) {
        let Some(style) = el.value().attr("style") else {
            continue;
        };
        let fg = FG_COLOR_DECL.captures(style).map(|c| c[1].trim().to_string());
        let bg = BG_COLOR_DECL.captures(style).map(|c| c[1].trim().to_string());
        if let (Some(fg), Some(bg)) = (fg, bg) {
            if fg == bg && fg != "transparent" && fg != "inherit" {
                feedback.push(
                    "Visual: Potential low contrast — an element's foreground and \
                     background colors appear identical."
                        .to_string(),
                );
                return;
            }
        }
    }
}

/// Broken same-document anchors and malformed external links.
fn check_links(document: &Html, feedback: &mut Vec<String>) {
    let ids: HashSet<&str> = document
        .select(&ID_SEL)
        .filter_map(|el| el.value().attr("id"))
        .collect();

    for link in document.select(&LINK_SEL) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if let Some(target) = href.strip_prefix('#') {
            if !target.is_empty() && !ids.contains(target) {
                feedback.push(format!(
                    "Link: Internal link '{href}' appears broken \
                     (no element with id='{target}' found)."
                ));
            }
        } else if href.starts_with("http://") || href.starts_with("https://") {
            let rest = href.split_once("://").map(|(_, r)| r).unwrap_or("");
            if !rest.contains('.') {
                feedback.push(format!(
                    "Link: External link '{href}' seems malformed or lacks a domain."
                ));
            }
        }
        // mailto:, tel: and friends are ignored.
    }
}

/// Buttons need visible text or an aria-label.
fn check_button_labels(document: &Html, feedback: &mut Vec<String>) {
    let mut flagged = 0;
    for button in document.select(&BUTTON_SEL) {
        let text: String = button.text().collect::<String>().trim().to_string();
        let aria = button.value().attr("aria-label").unwrap_or("").trim();
        if text.is_empty() && aria.is_empty() {
            feedback.push(
                "Accessibility: A <button> element has no discernible text content \
                 or aria-label. Add one for clarity."
                    .to_string(),
            );
            flagged += 1;
            if flagged >= 2 {
                break;
            }
        }
    }
}

/// Bounded tweak loop. Only invoked on a structurally valid document; the
/// returned document is guaranteed to still be structurally valid because
/// an invalid tweak is discarded in favor of the input.
pub async fn improve_quality(
    model: &dyn ChatModel,
    mut html: String,
    resume_text: &str,
    plan: &str,
    sink: Option<&StatusSink<'_>>,
) -> String {
    for attempt in 0..=MAX_TWEAK_ATTEMPTS {
        report(sink, "Analyzing website quality...");
        let feedback = analyze_quality(&html);
        if feedback.is_empty() {
            report(sink, "Quality analysis passed, no suggestions.");
            break;
        }
        if attempt == MAX_TWEAK_ATTEMPTS {
            report(sink, "Reached max quality tweak attempts; keeping current version.");
            break;
        }

        report(sink, "Attempting quality tweaks based on suggestions...");
        let system = TWEAK_SYSTEM_TEMPLATE
            .replace("{resume_text}", resume_text)
            .replace("{website_plan}", plan)
            .replace("{current_html}", &html)
            .replace("{quality_feedback}", &feedback.join("\n"));
        let messages = [ChatMessage::system(system), ChatMessage::user(TWEAK_USER)];

        let raw = match model.chat(&messages).await {
            Ok(raw) => raw,
            Err(e) => {
                // Tweaks are best-effort: a provider failure here never
                // fails the pipeline or loses the valid document.
                warn!("Quality tweak call failed: {e}");
                report(sink, "Quality tweak failed; keeping current version.");
                break;
            }
        };

        let tweaked = extract_html(&raw);
        report(sink, "Validating tweaked website...");
        if validate_document(&tweaked).is_empty() {
            report(sink, "Tweaked website passed validation.");
            html = tweaked;
            break;
        }
        warn!("Tweaked document failed structural validation; discarding tweak");
        report(sink, "Tweaked website failed validation; reverting.");
    }
    html
}
