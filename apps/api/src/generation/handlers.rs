//! HTTP handlers for the generation surface.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extract::pdf_to_text;
use crate::generation::edit::{apply_change, EditContext};
use crate::generation::{generate_site, SiteOutcome};
use crate::models::resume::ResumeRecord;
use crate::parser::parse_resume;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub resume_text: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerateResponse {
    Ok {
        html: String,
        structurally_valid: bool,
    },
    Rejected {
        reason: String,
    },
}

impl From<SiteOutcome> for GenerateResponse {
    fn from(outcome: SiteOutcome) -> Self {
        match outcome {
            SiteOutcome::Generated {
                html,
                structurally_valid,
            } => GenerateResponse::Ok {
                html,
                structurally_valid,
            },
            SiteOutcome::Rejected { reason } => GenerateResponse::Rejected { reason },
        }
    }
}

pub async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let resume_text = req.resume_text.trim();
    if resume_text.is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".to_string()));
    }

    info!("Generate request received ({} bytes of text)", resume_text.len());
    let outcome = generate_site(state.model.as_ref(), &state.cache, resume_text, None).await?;
    Ok(Json(outcome.into()))
}

/// Multipart variant: extracts text from an uploaded PDF, then runs the
/// same pipeline as `handle_generate`.
pub async fn handle_generate_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>, AppError> {
    let mut pdf_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
            pdf_bytes = Some(bytes);
            break;
        }
    }
    let Some(pdf_bytes) = pdf_bytes else {
        return Err(AppError::Validation(
            "Multipart body must contain a 'file' field with a PDF".to_string(),
        ));
    };

    info!("Upload received ({} bytes)", pdf_bytes.len());
    let resume_text = pdf_to_text(&pdf_bytes)?;
    if resume_text.trim().is_empty() {
        return Err(AppError::Pdf(
            "No text could be extracted from the uploaded PDF".to_string(),
        ));
    }

    let outcome =
        generate_site(state.model.as_ref(), &state.cache, resume_text.trim(), None).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub resume_text: String,
}

pub async fn handle_parse(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<ResumeRecord>, AppError> {
    let resume_text = req.resume_text.trim();
    if resume_text.is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".to_string()));
    }

    let record = parse_resume(state.model.as_ref(), &state.cache, resume_text, None).await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub html: String,
    pub request: String,
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub html: String,
    pub warnings: Vec<String>,
}

pub async fn handle_edit(
    State(state): State<AppState>,
    Json(req): Json<EditRequest>,
) -> Result<Json<EditResponse>, AppError> {
    if req.html.trim().is_empty() {
        return Err(AppError::Validation("html must not be empty".to_string()));
    }
    if req.request.trim().is_empty() {
        return Err(AppError::Validation("request must not be empty".to_string()));
    }

    let ctx = EditContext {
        resume_text: &req.resume_text,
        plan: &req.plan,
    };
    let outcome =
        apply_change(state.model.as_ref(), &req.html, &req.request, ctx, None).await;
    Ok(Json(EditResponse {
        html: outcome.html,
        warnings: outcome.warnings,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub url: String,
}

pub async fn handle_preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    if req.html.trim().is_empty() {
        return Err(AppError::Validation("html must not be empty".to_string()));
    }

    let url = state.preview.lock().await.start(&req.html).await?;
    Ok(Json(PreviewResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ArtifactCache;
    use crate::llm_client::testing::ScriptedModel;
    use crate::preview::PreviewServer;
    use std::sync::Arc;

    const PLAN_REPLY: &str = "IS_RESUME: TRUE\nPLAN:\n- Header";
    const CLEAN_DOC: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
        <title>Jane Doe</title>\
        <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
        <style>body { font-size: 16px; } section { padding: 2rem; margin: 1rem; }</style>\
        </head><body>\
        <section id=\"about\"><img src=\"avatar.svg\" alt=\"Jane\"></section>\
        <section id=\"work\"><a href=\"#about\">About</a></section>\
        </body></html>";

    fn state_with(model: ScriptedModel) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();
        let state = AppState {
            model: Arc::new(model),
            cache,
            preview: Arc::new(tokio::sync::Mutex::new(PreviewServer::new())),
        };
        (dir, state)
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_text() {
        let (_dir, state) = state_with(ScriptedModel::new(vec![]));
        let err = handle_generate(
            State(state),
            Json(GenerateRequest {
                resume_text: "   ".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_generate_returns_ok_status() {
        let (_dir, state) = state_with(ScriptedModel::new(vec![PLAN_REPLY, CLEAN_DOC]));
        let Json(resp) = handle_generate(
            State(state),
            Json(GenerateRequest {
                resume_text: "resume text".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            resp,
            GenerateResponse::Ok {
                html: CLEAN_DOC.to_string(),
                structurally_valid: true
            }
        );
    }

    #[tokio::test]
    async fn test_generate_returns_rejected_status() {
        let (_dir, state) =
            state_with(ScriptedModel::new(vec!["IS_RESUME: FALSE\nREASON: a recipe"]));
        let Json(resp) = handle_generate(
            State(state),
            Json(GenerateRequest {
                resume_text: "flour, eggs, sugar".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            resp,
            GenerateResponse::Rejected {
                reason: "a recipe".to_string()
            }
        );
    }

    #[test]
    fn test_generate_response_wire_format() {
        let ok = serde_json::to_value(GenerateResponse::Ok {
            html: "<p>x</p>".to_string(),
            structurally_valid: true,
        })
        .unwrap();
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["html"], "<p>x</p>");

        let rejected = serde_json::to_value(GenerateResponse::Rejected {
            reason: "nope".to_string(),
        })
        .unwrap();
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["reason"], "nope");
    }

    #[tokio::test]
    async fn test_edit_requires_both_fields() {
        let (_dir, state) = state_with(ScriptedModel::new(vec![]));
        let err = handle_edit(
            State(state),
            Json(EditRequest {
                html: "<p>x</p>".to_string(),
                request: "".to_string(),
                resume_text: String::new(),
                plan: String::new(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
