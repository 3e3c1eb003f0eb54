//! Website generation pipeline.
//!
//! Flow: plan → (reject non-resumes) → cached-document check → synthesis
//! state machine → quality tweak loop → cache final document.
//! All LLM calls go through the `ChatModel` trait — no direct provider
//! calls in this module tree.

pub mod edit;
pub mod handlers;
pub mod planner;
pub mod prompts;
pub mod quality;
pub mod synthesis;

use crate::cache::{fingerprint, ArtifactCache, ArtifactKind};
use crate::errors::AppError;
use crate::llm_client::ChatModel;
use crate::progress::{report, StatusSink};
use crate::validation::validate_document;

/// Result of a full pipeline run. The caller always gets either a usable
/// document or a structured reason for refusal — never a bare error for
/// the not-a-resume case.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteOutcome {
    Generated {
        html: String,
        /// False for best-effort documents with unresolved validation errors.
        structurally_valid: bool,
    },
    Rejected {
        reason: String,
    },
}

/// Runs the full resume-to-website pipeline.
///
/// The document cache key covers both the resume text and the plan, so a
/// changed plan invalidates the cached website even for identical text.
pub async fn generate_site(
    model: &dyn ChatModel,
    cache: &ArtifactCache,
    resume_text: &str,
    sink: Option<&StatusSink<'_>>,
) -> Result<SiteOutcome, AppError> {
    let plan_outcome = planner::plan(model, cache, resume_text, sink).await?;

    let Some(plan_text) = plan_outcome.plan else {
        let reason = plan_outcome
            .reason
            .unwrap_or_else(|| "The text does not appear to be a resume.".to_string());
        return Ok(SiteOutcome::Rejected { reason });
    };

    let fp = fingerprint(&[resume_text, &plan_text]);
    if let Some(html) = cache.get(ArtifactKind::Html, &fp) {
        report(sink, "Found cached website.");
        let structurally_valid = validate_document(&html).is_empty();
        return Ok(SiteOutcome::Generated {
            html,
            structurally_valid,
        });
    }

    report(sink, "Generating website from the plan...");
    let result = synthesis::synthesize(model, resume_text, &plan_text, sink).await?;

    if !result.structurally_valid {
        // Best effort over perfection: cache and deliver the last document
        // so repeated requests do not re-run the failing loop.
        cache.put(ArtifactKind::Html, &fp, &result.html);
        return Ok(SiteOutcome::Generated {
            html: result.html,
            structurally_valid: false,
        });
    }

    let html =
        quality::improve_quality(model, result.html, resume_text, &plan_text, sink).await;

    report(sink, "Caching final website version.");
    cache.put(ArtifactKind::Html, &fp, &html);
    Ok(SiteOutcome::Generated {
        html,
        structurally_valid: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    const PLAN_REPLY: &str = "IS_RESUME: TRUE\nPLAN:\n- Header\n- Skills";
    const REJECT_REPLY: &str = "IS_RESUME: FALSE\nREASON: no work history found";

    // Structurally valid and clean under every quality heuristic, so the
    // tweak loop makes no model call.
    const CLEAN_DOC: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
        <title>Jane Doe</title>\
        <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
        <style>body { font-size: 16px; } section { padding: 2rem; margin: 1rem; }</style>\
        </head><body>\
        <section id=\"about\"><img src=\"avatar.svg\" alt=\"Jane\"></section>\
        <section id=\"work\"><a href=\"#about\">About</a></section>\
        </body></html>";

    const BROKEN_REPLY: &str = "<div><style>body { color: }</style>broken</div>";

    fn cache() -> (tempfile::TempDir, ArtifactCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();
        (dir, cache)
    }

    #[tokio::test]
    async fn test_full_pipeline_generates_and_caches() {
        let (_dir, cache) = cache();
        let model = ScriptedModel::new(vec![PLAN_REPLY, CLEAN_DOC]);

        let outcome = generate_site(&model, &cache, "resume text", None).await.unwrap();
        assert_eq!(
            outcome,
            SiteOutcome::Generated {
                html: CLEAN_DOC.to_string(),
                structurally_valid: true
            }
        );
        assert_eq!(model.calls(), 2);

        // Second run is fully served from the cache.
        let again = generate_site(&model, &cache, "resume text", None).await.unwrap();
        assert_eq!(again, outcome);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_non_resume_input_is_rejected_with_reason() {
        let (_dir, cache) = cache();
        let model = ScriptedModel::new(vec![REJECT_REPLY]);

        let outcome = generate_site(&model, &cache, "a grocery list", None).await.unwrap();
        assert_eq!(
            outcome,
            SiteOutcome::Rejected {
                reason: "no work history found".to_string()
            }
        );
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_synthesis_still_delivers_and_caches() {
        let (_dir, cache) = cache();
        let attempts = (synthesis::MAX_FIX_ATTEMPTS + 1) as usize;
        let mut replies = vec![PLAN_REPLY];
        replies.extend(std::iter::repeat(BROKEN_REPLY).take(attempts));
        let model = ScriptedModel::new(replies);

        let outcome = generate_site(&model, &cache, "resume text", None).await.unwrap();
        let SiteOutcome::Generated {
            html,
            structurally_valid,
        } = outcome
        else {
            panic!("expected a generated document");
        };
        assert!(!structurally_valid);
        assert!(!html.is_empty());

        // The best-effort document was cached under resume+plan.
        let fp = fingerprint(&["resume text", "- Header\n- Skills"]);
        assert_eq!(cache.get(ArtifactKind::Html, &fp), Some(html));
    }

    #[tokio::test]
    async fn test_changed_plan_invalidates_document_cache() {
        let (_dir, cache) = cache();

        // Same resume text, but pre-seed two different plans to show the
        // document key depends on both inputs.
        let fp_a = fingerprint(&["resume text", "plan a"]);
        let fp_b = fingerprint(&["resume text", "plan b"]);
        assert_ne!(fp_a, fp_b);

        cache.put(ArtifactKind::Html, &fp_a, "doc a");
        assert!(cache.get(ArtifactKind::Html, &fp_b).is_none());
    }
}
