//! LLM-based resume parser.
//!
//! One model call per unique resume text: the reply is parsed as JSON,
//! normalized by the cleaner, and the normalized record is cached under
//! `parsed/{fingerprint}.json`.

use serde_json::Value;
use tracing::info;

use crate::cache::{fingerprint, ArtifactCache, ArtifactKind};
use crate::cleaner::normalize;
use crate::errors::AppError;
use crate::generation::prompts::PARSE_SYSTEM_TEMPLATE;
use crate::llm_client::{ChatMessage, ChatModel};
use crate::models::resume::ResumeRecord;
use crate::progress::{report, StatusSink};

/// Parses raw resume text into the canonical schema, cache-first.
pub async fn parse_resume(
    model: &dyn ChatModel,
    cache: &ArtifactCache,
    resume_text: &str,
    sink: Option<&StatusSink<'_>>,
) -> Result<ResumeRecord, AppError> {
    let fp = fingerprint(&[resume_text]);

    if let Some(cached) = cache.get(ArtifactKind::Parsed, &fp) {
        if let Ok(record) = serde_json::from_str::<ResumeRecord>(&cached) {
            report(sink, "Found cached parsed resume.");
            return Ok(record);
        }
        // Unreadable cache entry falls through to a fresh parse.
    }

    report(sink, "Parsing resume with the model...");
    let system = PARSE_SYSTEM_TEMPLATE.replace("{schema}", &ResumeRecord::schema_json());
    let reply = model
        .chat(&[
            ChatMessage::system(system),
            ChatMessage::user(resume_text),
        ])
        .await
        .map_err(|e| AppError::Llm(format!("Resume parsing failed: {e}")))?;

    let raw = extract_json(&reply)
        .ok_or_else(|| AppError::Llm("Resume parser reply contained no JSON object".to_string()))?;
    let record = normalize(&raw);
    info!("Parsed resume for '{}'", record.name);

    if let Ok(json) = serde_json::to_string_pretty(&record) {
        cache.put(ArtifactKind::Parsed, &fp, &json);
    }
    Ok(record)
}

/// Locates the JSON object in a model reply: direct parse first, then the
/// substring between the first `{` and the last `}` (fence-tolerant).
fn extract_json(reply: &str) -> Option<Value> {
    let trimmed = reply.trim().trim_matches('`');
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if start >= end {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}
