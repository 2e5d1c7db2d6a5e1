//! Passport extraction chain: vision LLM → MRZ → OCR patterns → failed.
//!
//! The ordering is deliberate: the vision model is the most accurate but
//! optional and costly; a checksum-validated MRZ is deterministic and high
//! confidence when present; label patterns over OCR text are the last
//! resort. Whatever happens, the caller gets a well-formed record — total
//! failure is a normal result with method `FAILED`, not an error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::collab::{DocumentInput, EntityRecognizer, OcrEngine, VisionExtractor};
use crate::config::Policy;
use crate::mrz;
use crate::pattern;
use crate::record::{ExtractionMethod, PassportRecord};

/// OCR output shorter than this carries too little signal to pattern-match.
const MIN_OCR_TEXT_LEN: usize = 50;
/// NER models degrade on very long inputs; the identity block is at the top.
const NER_TEXT_CAP: usize = 2000;

/// One self-contained passport extraction method. `attempt` returns a
/// record only when the strategy's own acceptance test passes; collaborator
/// failures are logged and surface as `None`.
#[async_trait::async_trait]
pub trait PassportStrategy: Send + Sync {
    fn method(&self) -> ExtractionMethod;
    async fn attempt(&self, input: &DocumentInput) -> Option<PassportRecord>;
}

/// Runs the ordered strategy list with a bounded timeout per attempt.
pub struct PassportOrchestrator {
    strategies: Vec<Box<dyn PassportStrategy>>,
    policy: Policy,
}

impl PassportOrchestrator {
    /// Collaborators are injected at construction; `None` means the
    /// capability is absent and its strategy is skipped entirely.
    pub fn new(
        vision: Option<Arc<dyn VisionExtractor>>,
        ocr: Arc<dyn OcrEngine>,
        ner: Option<Arc<dyn EntityRecognizer>>,
        policy: Policy,
    ) -> Self {
        let mut strategies: Vec<Box<dyn PassportStrategy>> = Vec::new();
        if let Some(vision) = vision {
            strategies.push(Box::new(VisionStrategy { vision }));
        }
        strategies.push(Box::new(MrzStrategy { ocr: ocr.clone() }));
        strategies.push(Box::new(OcrPatternStrategy { ocr, ner }));

        Self { strategies, policy }
    }

    pub async fn extract(&self, input: &DocumentInput) -> PassportRecord {
        for strategy in &self.strategies {
            let method = strategy.method();
            match tokio::time::timeout(self.policy.strategy_timeout(), strategy.attempt(input))
                .await
            {
                Ok(Some(record)) => {
                    debug!(?method, "passport strategy accepted");
                    return record
                        .with_provenance(method, self.policy.passport_confidence(method));
                }
                Ok(None) => debug!(?method, "passport strategy produced no result"),
                Err(_) => warn!(?method, "passport strategy timed out"),
            }
        }

        PassportRecord::default().with_provenance(ExtractionMethod::Failed, 0.0)
    }
}

// ── Strategies ──────────────────────────────────────────────────────────────

struct VisionStrategy {
    vision: Arc<dyn VisionExtractor>,
}

#[async_trait::async_trait]
impl PassportStrategy for VisionStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::LlmVision
    }

    async fn attempt(&self, input: &DocumentInput) -> Option<PassportRecord> {
        let record = match self.vision.extract_passport(input).await {
            Ok(record) => record?,
            Err(e) => {
                warn!("vision extraction failed: {e:#}");
                return None;
            }
        };
        record.has_identity().then_some(record)
    }
}

struct MrzStrategy {
    ocr: Arc<dyn OcrEngine>,
}

#[async_trait::async_trait]
impl PassportStrategy for MrzStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Mrz
    }

    async fn attempt(&self, input: &DocumentInput) -> Option<PassportRecord> {
        let text = match self.ocr.recognize(input).await {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR for MRZ scan failed: {e:#}");
                return None;
            }
        };
        let record = mrz::parse(&text)?;
        // A validated MRZ without a document number is not trustworthy.
        record.passport_number.is_some().then_some(record)
    }
}

struct OcrPatternStrategy {
    ocr: Arc<dyn OcrEngine>,
    ner: Option<Arc<dyn EntityRecognizer>>,
}

#[async_trait::async_trait]
impl PassportStrategy for OcrPatternStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::OcrPattern
    }

    async fn attempt(&self, input: &DocumentInput) -> Option<PassportRecord> {
        let text = match self.ocr.recognize(input).await {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR for pattern extraction failed: {e:#}");
                return None;
            }
        };
        if text.len() < MIN_OCR_TEXT_LEN {
            return None;
        }

        let persons = match &self.ner {
            Some(ner) => {
                let capped = cap_chars(&text, NER_TEXT_CAP);
                match ner.entities(capped).await {
                    Ok(entities) => entities
                        .into_iter()
                        .filter(|e| e.label == "PERSON")
                        .map(|e| e.text)
                        .collect(),
                    Err(e) => {
                        warn!("entity recognition failed: {e:#}");
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        let record = pattern::passport_from_text(&text, &persons);
        record.has_identity().then_some(record)
    }
}

fn cap_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::NamedEntity;
    use anyhow::anyhow;

    struct StubOcr(Option<String>);

    #[async_trait::async_trait]
    impl OcrEngine for StubOcr {
        fn name(&self) -> &str {
            "stub"
        }
        async fn recognize(&self, _input: &DocumentInput) -> anyhow::Result<String> {
            self.0.clone().ok_or_else(|| anyhow!("ocr down"))
        }
    }

    struct StubVision(Option<PassportRecord>);

    #[async_trait::async_trait]
    impl VisionExtractor for StubVision {
        async fn extract_passport(
            &self,
            _input: &DocumentInput,
        ) -> anyhow::Result<Option<PassportRecord>> {
            Ok(self.0.clone())
        }
    }

    struct StubNer(Vec<NamedEntity>);

    #[async_trait::async_trait]
    impl EntityRecognizer for StubNer {
        async fn entities(&self, _text: &str) -> anyhow::Result<Vec<NamedEntity>> {
            Ok(self
                .0
                .iter()
                .map(|e| NamedEntity {
                    label: e.label.clone(),
                    text: e.text.clone(),
                })
                .collect())
        }
    }

    fn doc() -> DocumentInput {
        DocumentInput::new("passport.jpg", vec![1, 2, 3])
    }

    const MRZ_TEXT: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\nL898902C36UTO7408122F1204159ZE184226B<<<<<10";

    #[tokio::test]
    async fn vision_result_wins_when_available() {
        let vision = StubVision(Some(PassportRecord {
            passport_number: Some("X1234567".to_string()),
            ..Default::default()
        }));
        let orch = PassportOrchestrator::new(
            Some(Arc::new(vision)),
            Arc::new(StubOcr(Some(MRZ_TEXT.to_string()))),
            None,
            Policy::default(),
        );

        let rec = orch.extract(&doc()).await;
        assert_eq!(rec.extraction_method, Some(ExtractionMethod::LlmVision));
        assert_eq!(rec.confidence_score, Some(0.95));
        assert_eq!(rec.passport_number.as_deref(), Some("X1234567"));
    }

    #[tokio::test]
    async fn empty_vision_result_falls_through_to_mrz() {
        let vision = StubVision(Some(PassportRecord::default()));
        let orch = PassportOrchestrator::new(
            Some(Arc::new(vision)),
            Arc::new(StubOcr(Some(MRZ_TEXT.to_string()))),
            None,
            Policy::default(),
        );

        let rec = orch.extract(&doc()).await;
        assert_eq!(rec.extraction_method, Some(ExtractionMethod::Mrz));
        assert_eq!(rec.confidence_score, Some(0.95));
        assert_eq!(rec.passport_number.as_deref(), Some("L898902C3"));
        assert_eq!(rec.last_name.as_deref(), Some("Eriksson"));
    }

    #[tokio::test]
    async fn ocr_pattern_is_last_resort_never_skipped_to_failed() {
        // No vision, no MRZ in the text, but 80 chars of OCR output with a
        // recognizable person: the result must be OCR_PATTERN at 0.7.
        let text = format!(
            "Some legal intake cover page for the applicant.{}",
            " filler".repeat(5)
        );
        assert!(text.len() >= 80);
        let ner = StubNer(vec![NamedEntity {
            label: "PERSON".to_string(),
            text: "Maria Silva".to_string(),
        }]);
        let orch = PassportOrchestrator::new(
            None,
            Arc::new(StubOcr(Some(text))),
            Some(Arc::new(ner)),
            Policy::default(),
        );

        let rec = orch.extract(&doc()).await;
        assert_eq!(rec.extraction_method, Some(ExtractionMethod::OcrPattern));
        assert_eq!(rec.confidence_score, Some(0.7));
        assert_eq!(rec.last_name.as_deref(), Some("Silva"));
        assert_eq!(rec.first_name.as_deref(), Some("Maria"));
    }

    #[tokio::test]
    async fn non_person_entities_are_ignored() {
        let text = "x".repeat(60);
        let ner = StubNer(vec![NamedEntity {
            label: "ORG".to_string(),
            text: "Acme Corp".to_string(),
        }]);
        let orch = PassportOrchestrator::new(
            None,
            Arc::new(StubOcr(Some(text))),
            Some(Arc::new(ner)),
            Policy::default(),
        );

        let rec = orch.extract(&doc()).await;
        assert_eq!(rec.extraction_method, Some(ExtractionMethod::Failed));
    }

    #[tokio::test]
    async fn exhausted_chain_returns_failed_record() {
        let orch = PassportOrchestrator::new(
            None,
            Arc::new(StubOcr(Some("too short".to_string()))),
            None,
            Policy::default(),
        );

        let rec = orch.extract(&doc()).await;
        assert_eq!(rec.extraction_method, Some(ExtractionMethod::Failed));
        assert_eq!(rec.confidence_score, Some(0.0));
        assert!(!rec.has_identity());
    }

    #[tokio::test]
    async fn ocr_outage_degrades_to_failed_not_error() {
        let orch = PassportOrchestrator::new(None, Arc::new(StubOcr(None)), None, Policy::default());
        let rec = orch.extract(&doc()).await;
        assert_eq!(rec.extraction_method, Some(ExtractionMethod::Failed));
        assert_eq!(rec.confidence_score, Some(0.0));
    }
}
