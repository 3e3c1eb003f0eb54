//! Incremental user-edit application.
//!
//! One model call, no repair loop: validation failures are downgraded to
//! warnings and the (possibly imperfect) result is returned. A provider
//! failure makes the whole operation a no-op — the caller's document is
//! never corrupted by a failed edit.

use tracing::warn;

use crate::generation::prompts::{EDIT_SYSTEM_TEMPLATE, EDIT_USER};
use crate::generation::synthesis::extract_html;
use crate::llm_client::{ChatMessage, ChatModel};
use crate::progress::{report, StatusSink};
use crate::validation::validate_document;

/// Contextual material embedded in the edit prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditContext<'a> {
    pub resume_text: &'a str,
    pub plan: &'a str,
}

#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub html: String,
    /// Validation findings on the edited document, reported but not repaired.
    pub warnings: Vec<String>,
}

pub async fn apply_change(
    model: &dyn ChatModel,
    html: &str,
    user_request: &str,
    ctx: EditContext<'_>,
    sink: Option<&StatusSink<'_>>,
) -> EditOutcome {
    report(sink, "Applying requested change...");
    let system = EDIT_SYSTEM_TEMPLATE
        .replace("{website_plan}", ctx.plan)
        .replace("{resume_text}", ctx.resume_text)
        .replace("{current_html}", html)
        .replace("{user_request}", user_request);
    let messages = [ChatMessage::system(system), ChatMessage::user(EDIT_USER)];

    let raw = match model.chat(&messages).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Edit call failed, returning document unchanged: {e}");
            report(sink, "Edit failed; document left unchanged.");
            return EditOutcome {
                html: html.to_string(),
                warnings: vec![format!("Edit was not applied: {e}")],
            };
        }
    };

    let edited = extract_html(&raw);
    let warnings: Vec<String> = validate_document(&edited)
        .into_iter()
        .map(|e| format!("Edited document has a validation issue: {e}"))
        .collect();
    if !warnings.is_empty() {
        warn!("Edited document failed validation with {} issue(s)", warnings.len());
        report(sink, "Edited document has validation warnings.");
    }
    EditOutcome {
        html: edited,
        warnings,
    }
}
