//! External collaborator contracts.
//!
//! The pipeline only consumes collaborators through these narrow traits, so
//! a backend can be swapped (or stubbed in tests) without touching the
//! strategies. Every failure crossing one of these boundaries is non-fatal:
//! the caller logs it and treats the strategy as having produced nothing.

pub mod ner;
pub mod ocr;
pub mod pdf_form;
pub mod vision;

use std::collections::HashMap;

use crate::record::PassportRecord;

/// An uploaded document: original filename (drives format decisions) plus
/// raw bytes.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub filename: String,
    pub data: Vec<u8>,
}

impl DocumentInput {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    /// Lowercased filename extension, without the dot.
    pub fn extension(&self) -> Option<String> {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
    }

    pub fn is_pdf(&self) -> bool {
        self.extension().as_deref() == Some("pdf")
    }

    pub fn is_image(&self) -> bool {
        matches!(self.extension().as_deref(), Some("jpg" | "jpeg" | "png"))
    }
}

/// OCR engine: document in, plain text out. `image → text | absent`.
#[async_trait::async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;
    async fn recognize(&self, input: &DocumentInput) -> anyhow::Result<String>;
}

/// Vision-capable LLM: `image, extraction schema → structured record | absent`.
/// Only fields matching the passport schema are trusted; the service's own
/// confidence metadata is ignored.
#[async_trait::async_trait]
pub trait VisionExtractor: Send + Sync {
    async fn extract_passport(&self, input: &DocumentInput)
        -> anyhow::Result<Option<PassportRecord>>;
}

/// One span found by the named-entity recognizer.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NamedEntity {
    pub label: String,
    pub text: String,
}

/// Named-entity recognizer: `text → list of (label, span)`. The pipeline
/// consumes only `PERSON`-labeled spans.
#[async_trait::async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn entities(&self, text: &str) -> anyhow::Result<Vec<NamedEntity>>;
}

/// PDF form-field reader: `document → field name → value | absent`.
/// Field names are fixed per source form revision and not validated here;
/// unknown names simply never match a mapping.
pub trait FormFieldReader: Send + Sync {
    fn read_fields(&self, data: &[u8]) -> anyhow::Result<HashMap<String, String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection() {
        let doc = DocumentInput::new("scan.Pdf", vec![]);
        assert_eq!(doc.extension().as_deref(), Some("pdf"));
        assert!(doc.is_pdf());
        assert!(!doc.is_image());

        let doc = DocumentInput::new("photo.JPEG", vec![]);
        assert!(doc.is_image());

        let doc = DocumentInput::new("noext", vec![]);
        assert_eq!(doc.extension(), None);
    }
}
