//! Plan Generator — classifies input text as resume-like and, if so,
//! produces a website content plan. One model call per unique resume text;
//! the raw reply is cached verbatim so it can be re-parsed later if the
//! protocol parsing changes.

use tracing::{info, warn};

use crate::cache::{fingerprint, ArtifactCache, ArtifactKind};
use crate::errors::AppError;
use crate::generation::prompts::PLAN_SYSTEM;
use crate::llm_client::{ChatMessage, ChatModel};
use crate::progress::{report, StatusSink};

/// First-line sentinel marking a resume-like input. The check is exact:
/// anything else on the first line means "not a resume".
const IS_RESUME_SENTINEL: &str = "IS_RESUME: TRUE";
const PLAN_MARKER: &str = "PLAN:";
const REASON_MARKER: &str = "REASON:";

const PLAN_FALLBACK: &str = "Plan details were not present in the expected format.";
const REASON_FALLBACK: &str = "The reply did not explain why the text is not a resume.";

/// Outcome of plan generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub plan: Option<String>,
    pub is_resume: bool,
    pub reason: Option<String>,
}

/// Returns the cached or freshly generated plan for this resume text.
pub async fn plan(
    model: &dyn ChatModel,
    cache: &ArtifactCache,
    resume_text: &str,
    sink: Option<&StatusSink<'_>>,
) -> Result<PlanOutcome, AppError> {
    let fp = fingerprint(&[resume_text]);

    if let Some(cached) = cache.get(ArtifactKind::Plan, &fp) {
        report(sink, "Found cached website plan.");
        return Ok(parse_plan_reply(&cached));
    }

    report(sink, "Analyzing resume and generating website plan...");
    let reply = model
        .chat(&[
            ChatMessage::system(PLAN_SYSTEM),
            ChatMessage::user(resume_text),
        ])
        .await
        .map_err(|e| AppError::Llm(format!("Plan generation failed: {e}")))?;

    // Stored verbatim, pre-parse: the cache format stays stable even if the
    // parsing below evolves.
    cache.put(ArtifactKind::Plan, &fp, &reply);

    let outcome = parse_plan_reply(&reply);
    if outcome.is_resume {
        info!("Website plan generated ({} bytes)", reply.len());
        report(sink, "Plan generated successfully.");
    } else {
        warn!("Input rejected as not a resume: {:?}", outcome.reason);
        report(sink, "The text does not appear to be a resume.");
    }
    Ok(outcome)
}

/// Parses one plan reply. The reply is untrusted, loosely-structured text:
/// every malformed variant degrades to a usable outcome, never an error.
pub fn parse_plan_reply(reply: &str) -> PlanOutcome {
    let first_line = reply.lines().next().unwrap_or("");

    if first_line.contains(IS_RESUME_SENTINEL) {
        let plan = reply
            .split_once(PLAN_MARKER)
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_else(|| PLAN_FALLBACK.to_string());
        PlanOutcome {
            plan: Some(plan),
            is_resume: true,
            reason: None,
        }
    } else {
        let reason = reply
            .split_once(REASON_MARKER)
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_else(|| REASON_FALLBACK.to_string());
        PlanOutcome {
            plan: None,
            is_resume: false,
            reason: Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    const GOOD_REPLY: &str = "IS_RESUME: TRUE\nPLAN:\n- Header: Jane Doe\n- Skills: Rust";

    fn cache() -> (tempfile::TempDir, ArtifactCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();
        (dir, cache)
    }

    #[test]
    fn test_parse_true_with_plan() {
        let outcome = parse_plan_reply(GOOD_REPLY);
        assert!(outcome.is_resume);
        assert_eq!(outcome.plan.as_deref(), Some("- Header: Jane Doe\n- Skills: Rust"));
        assert!(outcome.reason.is_none());
    }

    #[test]
    fn test_parse_false_with_reason() {
        let outcome = parse_plan_reply("IS_RESUME: FALSE\nREASON: no work history found");
        assert!(!outcome.is_resume);
        assert!(outcome.plan.is_none());
        assert_eq!(outcome.reason.as_deref(), Some("no work history found"));
    }

    #[test]
    fn test_parse_true_sentinel_without_plan_marker_degrades() {
        let outcome = parse_plan_reply("IS_RESUME: TRUE\nHere are some thoughts instead");
        assert!(outcome.is_resume);
        assert_eq!(outcome.plan.as_deref(), Some(PLAN_FALLBACK));
    }

    #[test]
    fn test_parse_false_without_reason_marker_degrades() {
        let outcome = parse_plan_reply("IS_RESUME: FALSE\nit just is not");
        assert!(!outcome.is_resume);
        assert_eq!(outcome.reason.as_deref(), Some(REASON_FALLBACK));
    }

    #[test]
    fn test_parse_sentinel_not_on_first_line_means_not_a_resume() {
        let outcome = parse_plan_reply("Sure! Here you go:\nIS_RESUME: TRUE\nPLAN: stuff");
        assert!(!outcome.is_resume);
    }

    #[test]
    fn test_parse_empty_reply() {
        let outcome = parse_plan_reply("");
        assert!(!outcome.is_resume);
        assert_eq!(outcome.reason.as_deref(), Some(REASON_FALLBACK));
    }

    #[test]
    fn test_parse_markers_in_wrong_order_still_splits() {
        // PLAN: appearing before the sentinel line is impossible by
        // construction (sentinel is line one), but PLAN: embedded mid-text
        // still yields the remainder after the first occurrence.
        let outcome = parse_plan_reply("IS_RESUME: TRUE extra\ntext PLAN: the actual plan");
        assert_eq!(outcome.plan.as_deref(), Some("the actual plan"));
    }

    #[tokio::test]
    async fn test_plan_cache_hit_skips_second_model_call() {
        let (_dir, cache) = cache();
        let model = ScriptedModel::new(vec![GOOD_REPLY]);

        let first = plan(&model, &cache, "resume text", None).await.unwrap();
        let second = plan(&model, &cache, "resume text", None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_plan_cache_stores_raw_reply_verbatim() {
        let (_dir, cache) = cache();
        let model = ScriptedModel::new(vec![GOOD_REPLY]);
        plan(&model, &cache, "resume text", None).await.unwrap();

        let fp = fingerprint(&["resume text"]);
        assert_eq!(cache.get(ArtifactKind::Plan, &fp).as_deref(), Some(GOOD_REPLY));
    }

    #[tokio::test]
    async fn test_plan_provider_failure_propagates() {
        let (_dir, cache) = cache();
        let model = crate::llm_client::testing::FailingModel;
        let err = plan(&model, &cache, "resume text", None).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_plan_reports_progress_to_sink() {
        let (_dir, cache) = cache();
        let model = ScriptedModel::new(vec![GOOD_REPLY]);
        let seen = std::sync::Mutex::new(Vec::new());
        let sink = |msg: &str| seen.lock().unwrap().push(msg.to_string());

        plan(&model, &cache, "resume text", Some(&sink)).await.unwrap();
        assert!(!seen.lock().unwrap().is_empty());
    }
}
