//! Named-entity recognizer sidecar.

use serde::Serialize;
use tracing::info;

use super::{EntityRecognizer, NamedEntity};

#[derive(Serialize)]
struct NerRequest<'a> {
    text: &'a str,
}

/// NER over an HTTP sidecar wrapping a spaCy-style model.
pub struct NerSidecar {
    url: String,
    client: reqwest::Client,
}

impl NerSidecar {
    /// Construct from `NER_SIDECAR_URL`. Absence of the variable means the
    /// capability is not available, which callers model as `None` rather
    /// than a runtime failure.
    pub fn from_env(client: reqwest::Client) -> Option<Self> {
        let url = std::env::var("NER_SIDECAR_URL").ok()?;
        Some(Self { url, client })
    }
}

#[async_trait::async_trait]
impl EntityRecognizer for NerSidecar {
    async fn entities(&self, text: &str) -> anyhow::Result<Vec<NamedEntity>> {
        info!("NerSidecar: recognizing entities in {} chars", text.len());

        let response = self
            .client
            .post(format!("{}/entities", self.url))
            .json(&NerRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("NER sidecar error ({}): {}", status, error_text);
        }

        let entities: Vec<NamedEntity> = response.json().await?;
        Ok(entities)
    }
}
