//! HTML Synthesis Engine — bounded generate/validate/repair state machine.
//!
//! Attempt 0 generates from the plan and resume text; each repair attempt
//! feeds the previous document plus the exact validator error strings back
//! to the model. After the attempt ceiling the last document is returned
//! anyway: a broken-but-present website beats total failure.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::prompts::{
    FIX_SYSTEM_TEMPLATE, FIX_USER, GENERATE_SYSTEM_TEMPLATE, GENERATE_USER,
};
use crate::llm_client::{ChatMessage, ChatModel};
use crate::progress::{report, StatusSink};
use crate::validation::validate_document;

/// Repair attempts after the initial generation.
pub const MAX_FIX_ATTEMPTS: u32 = 2;

/// States of the synthesis machine. Each transition is a pure function of
/// (current state, validation report), which keeps the loop testable.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisState {
    Generating {
        attempt: u32,
        errors: Vec<String>,
        previous: Option<String>,
    },
    Validating {
        attempt: u32,
        html: String,
    },
    Valid {
        html: String,
    },
    Exhausted {
        html: String,
    },
}

impl SynthesisState {
    pub fn initial() -> Self {
        SynthesisState::Generating {
            attempt: 0,
            errors: vec![],
            previous: None,
        }
    }
}

/// Transition out of validation: clean report terminates, otherwise the
/// machine loops back to generation until the attempt ceiling.
pub fn after_validation(attempt: u32, html: String, errors: &[String]) -> SynthesisState {
    if errors.is_empty() {
        SynthesisState::Valid { html }
    } else if attempt >= MAX_FIX_ATTEMPTS {
        SynthesisState::Exhausted { html }
    } else {
        SynthesisState::Generating {
            attempt: attempt + 1,
            errors: errors.to_vec(),
            previous: Some(html),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub html: String,
    /// False when the attempt ceiling was reached with errors remaining —
    /// the document is best-effort.
    pub structurally_valid: bool,
}

/// Drives the state machine to a terminal state. The returned document is
/// never empty as long as the model returns text; provider failures
/// propagate to the caller.
pub async fn synthesize(
    model: &dyn ChatModel,
    resume_text: &str,
    plan: &str,
    sink: Option<&StatusSink<'_>>,
) -> Result<SynthesisResult, AppError> {
    let mut state = SynthesisState::initial();

    loop {
        state = match state {
            SynthesisState::Generating {
                attempt,
                errors,
                previous,
            } => {
                let messages = if attempt == 0 {
                    report(sink, "Calling the model for initial website generation...");
                    generation_messages(resume_text, plan)
                } else {
                    report(sink, "Asking the model to fix validation errors...");
                    repair_messages(resume_text, plan, &previous.unwrap_or_default(), &errors)
                };
                info!(
                    "Synthesis attempt {}/{}",
                    attempt + 1,
                    MAX_FIX_ATTEMPTS + 1
                );
                let raw = model
                    .chat(&messages)
                    .await
                    .map_err(|e| AppError::Llm(format!("Website generation failed: {e}")))?;
                SynthesisState::Validating {
                    attempt,
                    html: extract_html(&raw),
                }
            }
            SynthesisState::Validating { attempt, html } => {
                report(sink, "Validating generated website (HTML/CSS)...");
                let errors = validate_document(&html);
                if !errors.is_empty() {
                    warn!(
                        "Validation failed on attempt {}/{}: {} error(s)",
                        attempt + 1,
                        MAX_FIX_ATTEMPTS + 1,
                        errors.len()
                    );
                }
                after_validation(attempt, html, &errors)
            }
            SynthesisState::Valid { html } => {
                report(sink, "Website validation passed.");
                return Ok(SynthesisResult {
                    html,
                    structurally_valid: true,
                });
            }
            SynthesisState::Exhausted { html } => {
                warn!(
                    "Returning best-effort document after {} attempts",
                    MAX_FIX_ATTEMPTS + 1
                );
                report(sink, "Validation errors remain; using last generated version.");
                return Ok(SynthesisResult {
                    html,
                    structurally_valid: false,
                });
            }
        };
    }
}

fn generation_messages(resume_text: &str, plan: &str) -> Vec<ChatMessage> {
    let system = GENERATE_SYSTEM_TEMPLATE
        .replace("{website_plan}", plan)
        .replace("{resume_text}", resume_text);
    vec![ChatMessage::system(system), ChatMessage::user(GENERATE_USER)]
}

fn repair_messages(
    resume_text: &str,
    plan: &str,
    previous_html: &str,
    errors: &[String],
) -> Vec<ChatMessage> {
    let system = FIX_SYSTEM_TEMPLATE
        .replace("{resume_text}", resume_text)
        .replace("{website_plan}", plan)
        .replace("{previous_html}", previous_html)
        .replace("{errors}", &errors.join("\n"));
    vec![ChatMessage::system(system), ChatMessage::user(FIX_USER)]
}

/// Extracts the HTML document from a raw model reply.
///
/// Prefers the slice from the first case-insensitive doctype declaration to
/// the last closing html tag; falls back to stripping a wrapping code
/// fence; otherwise returns the trimmed reply. Total — never fails, though
/// the result may be imperfect.
pub fn extract_html(raw: &str) -> String {
    const DOCTYPE: &str = "<!doctype html>";
    const END_TAG: &str = "</html>";

    let lower = raw.to_ascii_lowercase();
    if let (Some(start), Some(end)) = (lower.find(DOCTYPE), lower.rfind(END_TAG)) {
        if start < end {
            return raw[start..end + END_TAG.len()].to_string();
        }
    }

    let stripped = raw.trim();
    if let Some(inner) = stripped
        .strip_prefix("```html")
        .and_then(|s| s.strip_suffix("```"))
    {
        return inner.trim().to_string();
    }
    if let Some(inner) = stripped
        .strip_prefix("```")
        .and_then(|s| s.strip_suffix("```"))
    {
        return inner.trim().to_string();
    }

    stripped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    const VALID_DOC: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
        <title>Jane Doe</title><style>body { color: #111; font-size: 16px; }</style>\
        </head><body><h1>Jane Doe</h1><p>Engineer</p></body></html>";

    // Missing doctype plus a broken declaration: fails both validators.
    const BROKEN_REPLY: &str = "<div><style>body { color: }</style>broken</div>";

    #[test]
    fn test_extract_html_slices_between_doctype_and_end_tag() {
        let raw = format!("Sure, here is the site:\n{VALID_DOC}\nHope it helps!");
        assert_eq!(extract_html(&raw), VALID_DOC);
    }

    #[test]
    fn test_extract_html_is_case_insensitive() {
        let raw = "<!doctype HTML><html><body></body></HTML>";
        assert_eq!(extract_html(raw), raw);
    }

    #[test]
    fn test_extract_html_uses_last_end_tag() {
        let raw = "<!DOCTYPE html><html><body><code></html></code></body></html>";
        assert_eq!(extract_html(raw), raw);
    }

    #[test]
    fn test_extract_html_strips_html_fence() {
        let raw = "```html\n<section>partial</section>\n```";
        assert_eq!(extract_html(raw), "<section>partial</section>");
    }

    #[test]
    fn test_extract_html_strips_bare_fence() {
        let raw = "```\n<section>partial</section>\n```";
        assert_eq!(extract_html(raw), "<section>partial</section>");
    }

    #[test]
    fn test_extract_html_falls_back_to_trimmed_reply() {
        assert_eq!(extract_html("  no markers at all  "), "no markers at all");
        assert_eq!(extract_html(""), "");
    }

    #[test]
    fn test_extract_html_ignores_reversed_markers() {
        let raw = "</html> text before doctype <!DOCTYPE html>";
        assert_eq!(extract_html(raw), raw.trim());
    }

    #[test]
    fn test_after_validation_clean_report_is_terminal() {
        let state = after_validation(0, "doc".to_string(), &[]);
        assert_eq!(state, SynthesisState::Valid { html: "doc".to_string() });
    }

    #[test]
    fn test_after_validation_errors_loop_back_with_context() {
        let errors = vec!["HTML parse error: x".to_string()];
        let state = after_validation(0, "doc".to_string(), &errors);
        assert_eq!(
            state,
            SynthesisState::Generating {
                attempt: 1,
                errors,
                previous: Some("doc".to_string()),
            }
        );
    }

    #[test]
    fn test_after_validation_ceiling_exhausts() {
        let errors = vec!["still broken".to_string()];
        let state = after_validation(MAX_FIX_ATTEMPTS, "doc".to_string(), &errors);
        assert_eq!(state, SynthesisState::Exhausted { html: "doc".to_string() });
    }

    #[tokio::test]
    async fn test_valid_first_attempt_never_repairs() {
        let model = ScriptedModel::new(vec![VALID_DOC]);
        let result = synthesize(&model, "resume", "plan", None).await.unwrap();
        assert!(result.structurally_valid);
        assert_eq!(result.html, VALID_DOC);
        // Exactly one call: the repair path was never taken.
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_still_return_a_document() {
        let model = ScriptedModel::repeating(BROKEN_REPLY, (MAX_FIX_ATTEMPTS + 1) as usize);
        let result = synthesize(&model, "resume", "plan", None).await.unwrap();
        assert!(!result.structurally_valid);
        assert!(!result.html.is_empty());
        assert_eq!(model.calls(), (MAX_FIX_ATTEMPTS + 1) as usize);
    }

    #[tokio::test]
    async fn test_repair_attempt_can_recover() {
        let model = ScriptedModel::new(vec![BROKEN_REPLY, VALID_DOC]);
        let result = synthesize(&model, "resume", "plan", None).await.unwrap();
        assert!(result.structurally_valid);
        assert_eq!(result.html, VALID_DOC);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let model = crate::llm_client::testing::FailingModel;
        let err = synthesize(&model, "resume", "plan", None).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
