//! Extraction policy configuration.
//!
//! The acceptance threshold and the per-strategy confidence constants are
//! operational policy, not calibrated truths, so they stay overridable from
//! the environment instead of being baked into the strategies.

use std::time::Duration;

use crate::record::ExtractionMethod;

#[derive(Debug, Clone)]
pub struct Policy {
    /// A strategy result is accepted only if its score strictly exceeds this.
    pub accept_threshold: f64,
    /// Fixed confidence attached to a vision-LLM result.
    pub llm_confidence: f64,
    /// Fixed confidence attached to a checksum-validated MRZ result.
    pub mrz_confidence: f64,
    /// Fixed confidence attached to a passport OCR-pattern result.
    pub ocr_confidence: f64,
    /// Fixed confidence attached to a G-28 beneficiary name record.
    pub beneficiary_confidence: f64,
    /// Bound on each strategy attempt; a stalled collaborator call is
    /// treated as strategy failure, not a hard error.
    pub strategy_timeout_secs: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            accept_threshold: 0.3,
            llm_confidence: 0.95,
            mrz_confidence: 0.95,
            ocr_confidence: 0.7,
            beneficiary_confidence: 0.5,
            strategy_timeout_secs: 30,
        }
    }
}

impl Policy {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut policy = Self::default();
        override_f64("INTAKE_ACCEPT_THRESHOLD", &mut policy.accept_threshold);
        override_f64("INTAKE_LLM_CONFIDENCE", &mut policy.llm_confidence);
        override_f64("INTAKE_MRZ_CONFIDENCE", &mut policy.mrz_confidence);
        override_f64("INTAKE_OCR_CONFIDENCE", &mut policy.ocr_confidence);
        override_f64(
            "INTAKE_BENEFICIARY_CONFIDENCE",
            &mut policy.beneficiary_confidence,
        );
        if let Ok(v) = std::env::var("INTAKE_STRATEGY_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                policy.strategy_timeout_secs = secs;
            }
        }
        policy
    }

    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_secs(self.strategy_timeout_secs)
    }

    /// The fixed confidence carried by a passport strategy's accepted result.
    pub fn passport_confidence(&self, method: ExtractionMethod) -> f64 {
        match method {
            ExtractionMethod::LlmVision => self.llm_confidence,
            ExtractionMethod::Mrz => self.mrz_confidence,
            ExtractionMethod::OcrPattern => self.ocr_confidence,
            ExtractionMethod::G28Beneficiary => self.beneficiary_confidence,
            ExtractionMethod::PdfFormFields | ExtractionMethod::Failed => 0.0,
        }
    }
}

fn override_f64(var: &str, slot: &mut f64) {
    if let Ok(v) = std::env::var(var) {
        if let Ok(parsed) = v.parse() {
            *slot = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy_constants() {
        let p = Policy::default();
        assert_eq!(p.accept_threshold, 0.3);
        assert_eq!(p.passport_confidence(ExtractionMethod::LlmVision), 0.95);
        assert_eq!(p.passport_confidence(ExtractionMethod::Mrz), 0.95);
        assert_eq!(p.passport_confidence(ExtractionMethod::OcrPattern), 0.7);
        assert_eq!(p.passport_confidence(ExtractionMethod::G28Beneficiary), 0.5);
    }
}
