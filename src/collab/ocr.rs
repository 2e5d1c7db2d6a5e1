//! Tesseract sidecar OCR engine.

use serde::Deserialize;
use tracing::info;

use super::{DocumentInput, OcrEngine};

/// Sidecar response (private deserialization type).
#[derive(Debug, Deserialize)]
struct OcrResponse {
    text: String,
}

/// OCR over a small HTTP sidecar wrapping tesseract. The sidecar rasterizes
/// PDFs itself, so the engine just forwards bytes.
pub struct OcrSidecar {
    url: String,
    client: reqwest::Client,
}

impl OcrSidecar {
    pub fn new(client: reqwest::Client) -> Self {
        let url =
            std::env::var("OCR_SIDECAR_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());
        Self { url, client }
    }
}

#[async_trait::async_trait]
impl OcrEngine for OcrSidecar {
    fn name(&self) -> &str {
        "tesseract_sidecar"
    }

    async fn recognize(&self, input: &DocumentInput) -> anyhow::Result<String> {
        use reqwest::multipart::{Form, Part};

        let mime = if input.is_pdf() {
            "application/pdf"
        } else {
            "image/jpeg"
        };

        let part = Part::bytes(input.data.clone())
            .file_name(input.filename.clone())
            .mime_str(mime)?;
        let form = Form::new().part("file", part);

        info!(
            "OcrSidecar: sending {} ({} bytes) for recognition",
            input.filename,
            input.data.len()
        );

        let response = self
            .client
            .post(format!("{}/ocr", self.url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OCR sidecar error ({}): {}", status, error_text);
        }

        let ocr: OcrResponse = response.json().await?;
        Ok(ocr.text)
    }
}
