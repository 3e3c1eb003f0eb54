//! PDF → raw text.
//!
//! Thin collaborator in front of `pdf-extract`: the pipeline only needs
//! plain text. Strips `(cid:N)` glyph artifacts that leak out of PDFs with
//! broken font maps.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;

static CID_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(cid:\d+\)").expect("invalid cid regex"));

pub fn pdf_to_text(bytes: &[u8]) -> Result<String, AppError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Pdf(format!("Failed to extract text from PDF: {e}")))?;
    Ok(CID_ARTIFACT.replace_all(&text, "").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cid_artifacts_are_stripped() {
        let noisy = "John(cid:12) Smith(cid:345)\nEngineer";
        assert_eq!(CID_ARTIFACT.replace_all(noisy, ""), "John Smith\nEngineer");
    }

    #[test]
    fn test_invalid_pdf_bytes_surface_as_error() {
        let err = pdf_to_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, AppError::Pdf(_)));
    }
}
