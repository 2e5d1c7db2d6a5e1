//! Vision-capable LLM passport extraction client.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info};

use super::{DocumentInput, VisionExtractor};
use crate::normalize::normalize_date;
use crate::record::{PassportRecord, Sex};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";

const EXTRACTION_PROMPT: &str = r#"You are an expert in passport data extraction. Analyze this passport image and extract all visible information.

Return JSON with these fields (use null if not found):
{
  "last_name": "Family name / Surname",
  "first_name": "First given name",
  "middle_name": "Middle name(s) if any",
  "passport_number": "Document number",
  "country_of_issue": "Full country name",
  "nationality": "Nationality of holder",
  "date_of_birth": "YYYY-MM-DD format",
  "place_of_birth": "City/Place of birth",
  "sex": "M or F",
  "date_of_issue": "YYYY-MM-DD format",
  "date_of_expiration": "YYYY-MM-DD format"
}

Instructions:
1. Read BOTH the visual zone (printed text) AND the MRZ (bottom lines)
2. Prefer visual zone labels (Surname, Given names, etc.) for names
3. Convert all dates to YYYY-MM-DD format
4. Return ONLY valid JSON"#;

/// Chat-completions client for a vision-capable model.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl VisionClient {
    /// Create a client from `OPENAI_API_KEY` (with optional `VISION_API_URL`
    /// / `VISION_MODEL` overrides). A missing key is a construction-time
    /// absence: the orchestrator then runs without the vision strategy.
    pub fn from_env(client: Client) -> Result<Self> {
        let api_key =
            env::var("OPENAI_API_KEY").context("OPENAI_API_KEY environment variable not set")?;
        Ok(Self {
            client,
            api_url: env::var("VISION_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key,
            model: env::var("VISION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }

    async fn send(&self, request: ChatCompletionRequest) -> Result<String> {
        debug!("VisionClient: sending request, model={}", request.model);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send vision request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Vision API error ({}): {}", status, error_text);
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse vision API response")?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl VisionExtractor for VisionClient {
    async fn extract_passport(
        &self,
        input: &DocumentInput,
    ) -> Result<Option<PassportRecord>> {
        // PDFs need rasterization we do not do in-process; image uploads only.
        if !input.is_image() {
            return Ok(None);
        }

        let data_url = image_data_url(&input.data);
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: EXTRACTION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url,
                            detail: Some("high".to_string()),
                        },
                    },
                ],
            }],
            max_tokens: Some(1000),
            temperature: Some(0.0),
        };

        let response = self.send(request).await?;
        info!("VisionClient: response length {} chars", response.len());

        let wire: VisionPassport = parse_llm_json(&response)?;
        Ok(Some(wire.into_record()))
    }
}

/// Build a base64 data URL, sniffing the real image format from magic bytes
/// rather than trusting the filename.
fn image_data_url(data: &[u8]) -> String {
    let mime = match image::guess_format(data) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        _ => "image/jpeg",
    };
    format!("data:{};base64,{}", mime, BASE64.encode(data))
}

/// Extract JSON from a possibly fence-wrapped LLM response.
fn parse_llm_json<T: serde::de::DeserializeOwned>(response: &str) -> Result<T> {
    let json_str = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
            .trim()
    } else if response.contains("```") {
        response.split("```").nth(1).unwrap_or(response).trim()
    } else {
        response.trim()
    };

    serde_json::from_str(json_str).context(format!(
        "Failed to parse vision response as JSON: {}",
        &json_str.chars().take(200).collect::<String>()
    ))
}

// ── Request/response types ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Wire shape of the model's JSON answer. Everything is an optional string;
/// only fields matching the passport schema are carried over.
#[derive(Debug, Default, Deserialize)]
struct VisionPassport {
    last_name: Option<String>,
    first_name: Option<String>,
    middle_name: Option<String>,
    passport_number: Option<String>,
    country_of_issue: Option<String>,
    nationality: Option<String>,
    date_of_birth: Option<String>,
    place_of_birth: Option<String>,
    sex: Option<String>,
    date_of_issue: Option<String>,
    date_of_expiration: Option<String>,
}

impl VisionPassport {
    fn into_record(self) -> PassportRecord {
        PassportRecord {
            last_name: self.last_name,
            first_name: self.first_name,
            middle_name: self.middle_name,
            passport_number: self.passport_number,
            country_of_issue: self.country_of_issue,
            nationality: self.nationality,
            date_of_birth: self.date_of_birth.as_deref().map(normalize_date),
            place_of_birth: self.place_of_birth,
            sex: self.sex.as_deref().and_then(Sex::parse),
            date_of_issue: self.date_of_issue.as_deref().map(normalize_date),
            date_of_expiration: self.date_of_expiration.as_deref().map(normalize_date),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_response() {
        let response = "```json\n{\"last_name\": \"Eriksson\", \"sex\": \"F\"}\n```";
        let wire: VisionPassport = parse_llm_json(response).unwrap();
        let rec = wire.into_record();
        assert_eq!(rec.last_name.as_deref(), Some("Eriksson"));
        assert_eq!(rec.sex, Some(Sex::F));
    }

    #[test]
    fn parses_bare_json_with_nulls() {
        let response = "{\"passport_number\": \"X1234567\", \"last_name\": null}";
        let wire: VisionPassport = parse_llm_json(response).unwrap();
        let rec = wire.into_record();
        assert_eq!(rec.passport_number.as_deref(), Some("X1234567"));
        assert_eq!(rec.last_name, None);
    }

    #[test]
    fn garbage_response_is_an_error_not_a_panic() {
        let result: Result<VisionPassport> = parse_llm_json("I could not read the image, sorry.");
        assert!(result.is_err());
    }
}
