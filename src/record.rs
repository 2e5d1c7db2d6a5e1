//! Extracted record types shared across the pipeline.
//!
//! Sub-records are value snapshots: an orchestrator produces a whole record,
//! the session store replaces the previous one wholesale. The only field-level
//! mutation is the beneficiary merge in [`crate::merge`].

use serde::{Deserialize, Serialize};

/// Which strategy produced a record. Stored alongside the confidence score
/// so downstream consumers can audit where each record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    #[serde(rename = "LLM_VISION")]
    LlmVision,
    #[serde(rename = "MRZ")]
    Mrz,
    #[serde(rename = "OCR_PATTERN")]
    OcrPattern,
    #[serde(rename = "PDF_FORM_FIELDS")]
    PdfFormFields,
    #[serde(rename = "G28_BENEFICIARY")]
    G28Beneficiary,
    #[serde(rename = "FAILED")]
    Failed,
}

impl ExtractionMethod {
    /// Wire-format label, for log lines and response messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMethod::LlmVision => "LLM_VISION",
            ExtractionMethod::Mrz => "MRZ",
            ExtractionMethod::OcrPattern => "OCR_PATTERN",
            ExtractionMethod::PdfFormFields => "PDF_FORM_FIELDS",
            ExtractionMethod::G28Beneficiary => "G28_BENEFICIARY",
            ExtractionMethod::Failed => "FAILED",
        }
    }
}

/// Sex code as printed in the passport visual zone and MRZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
    X,
}

impl Sex {
    /// Parse the spelled-out or single-letter forms seen in OCR text and
    /// LLM output. Unknown values map to `None`, never to a guess.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "M" | "MALE" => Some(Sex::M),
            "F" | "FEMALE" => Some(Sex::F),
            "X" => Some(Sex::X),
            _ => None,
        }
    }
}

/// Extracted passport data. Every field is optional; strategies fill what
/// they can and leave the rest unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassportRecord {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub passport_number: Option<String>,
    pub country_of_issue: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<String>,
    pub place_of_birth: Option<String>,
    pub sex: Option<Sex>,
    pub date_of_issue: Option<String>,
    pub date_of_expiration: Option<String>,
    pub extraction_method: Option<ExtractionMethod>,
    pub confidence_score: Option<f64>,
}

impl PassportRecord {
    /// Attach provenance. Method and score are always set together;
    /// this is the only place either field is written.
    pub fn with_provenance(mut self, method: ExtractionMethod, confidence: f64) -> Self {
        self.extraction_method = Some(method);
        self.confidence_score = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// A passport result is worth keeping when it identifies the document
    /// or the holder.
    pub fn has_identity(&self) -> bool {
        self.passport_number.is_some() || self.last_name.is_some()
    }
}

/// Extracted attorney / accredited-representative data (G-28 form).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeRecord {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub street_address: Option<String>,
    pub apt_ste_flr: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub daytime_phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub email: Option<String>,
    pub licensing_authority: Option<String>,
    pub bar_number: Option<String>,
    pub law_firm_name: Option<String>,
    pub online_account_number: Option<String>,
    pub extraction_method: Option<ExtractionMethod>,
    pub confidence_score: Option<f64>,
}

impl RepresentativeRecord {
    pub fn with_provenance(mut self, method: ExtractionMethod, confidence: f64) -> Self {
        self.extraction_method = Some(method);
        self.confidence_score = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// The G-28 revision in circulation sometimes carries an email address in
    /// the mobile-phone widget. An `@` must never persist in a phone field:
    /// relocate the value to email (when email is still unset) and clear the
    /// phone either way.
    pub fn repair_misplaced_email(&mut self) {
        if let Some(phone) = self.mobile_phone.take() {
            if phone.contains('@') {
                if self.email.is_none() {
                    self.email = Some(phone.to_lowercase());
                }
            } else {
                self.mobile_phone = Some(phone);
            }
        }
    }
}

/// One reconciled record per case, keyed by an opaque session id.
/// Created on first successful upload, mutated in place by later ones,
/// only ever destroyed by an explicit delete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseRecord {
    pub passport: Option<PassportRecord>,
    pub representative: Option<RepresentativeRecord>,
}
