//! G-28 (notice of appearance) extraction chain: PDF form fields → OCR
//! patterns → failed.
//!
//! Fillable G-28s carry AcroForm fields with fixed names per form revision,
//! which is by far the most reliable source. Scanned copies fall back to
//! label patterns over OCR text. Either way the result is scored from field
//! presence and only accepted above the policy threshold.
//!
//! A G-28 also names the case subject (the beneficiary). When at least one
//! beneficiary name field is filled, the chain additionally yields a
//! passport-shaped partial record for the cross-document merge.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::collab::{DocumentInput, FormFieldReader, OcrEngine};
use crate::confidence::representative_score;
use crate::config::Policy;
use crate::pattern;
use crate::record::{ExtractionMethod, PassportRecord, RepresentativeRecord};

pub struct G28Orchestrator {
    form_reader: Arc<dyn FormFieldReader>,
    ocr: Arc<dyn OcrEngine>,
    policy: Policy,
}

/// Accepted representative record plus the optional beneficiary partial.
pub struct G28Extraction {
    pub representative: RepresentativeRecord,
    pub beneficiary: Option<PassportRecord>,
}

impl G28Orchestrator {
    pub fn new(
        form_reader: Arc<dyn FormFieldReader>,
        ocr: Arc<dyn OcrEngine>,
        policy: Policy,
    ) -> Self {
        Self {
            form_reader,
            ocr,
            policy,
        }
    }

    pub async fn extract(&self, input: &DocumentInput) -> G28Extraction {
        if input.is_pdf() {
            match tokio::time::timeout(self.policy.strategy_timeout(), self.try_form_fields(input))
                .await
            {
                Ok(Some(extraction)) => return extraction,
                Ok(None) => debug!("PDF form fields produced no accepted result"),
                Err(_) => warn!("PDF form field read timed out"),
            }
        }

        match tokio::time::timeout(self.policy.strategy_timeout(), self.try_ocr_pattern(input))
            .await
        {
            Ok(Some(extraction)) => return extraction,
            Ok(None) => debug!("OCR pattern extraction produced no accepted result"),
            Err(_) => warn!("G-28 OCR strategy timed out"),
        }

        G28Extraction {
            representative: RepresentativeRecord::default()
                .with_provenance(ExtractionMethod::Failed, 0.0),
            beneficiary: None,
        }
    }

    async fn try_form_fields(&self, input: &DocumentInput) -> Option<G28Extraction> {
        let reader = Arc::clone(&self.form_reader);
        let data = input.data.clone();
        // lopdf parsing is synchronous; run it off the runtime so the
        // surrounding timeout can fire and other sessions keep moving.
        let fields = match tokio::task::spawn_blocking(move || reader.read_fields(&data)).await {
            Ok(Ok(fields)) => fields,
            Ok(Err(e)) => {
                warn!("PDF form field extraction failed: {e:#}");
                return None;
            }
            Err(e) => {
                warn!("PDF form field task failed: {e}");
                return None;
            }
        };
        if fields.is_empty() {
            return None;
        }

        let mut representative = RepresentativeRecord::default();
        for (key, value) in &fields {
            if let Some(value) = clean_form_value(value) {
                apply_representative_field(&mut representative, key, value);
            }
        }
        representative.repair_misplaced_email();

        let score = representative_score(&representative);
        if score <= self.policy.accept_threshold {
            return None;
        }

        let mut beneficiary = PassportRecord::default();
        for (key, value) in &fields {
            if let Some(value) = clean_form_value(value) {
                apply_beneficiary_field(&mut beneficiary, key, value);
            }
        }
        // Part 3 gates on its own name fields, not the passport acceptance
        // rule: a given name alone still identifies the case subject.
        let has_name = beneficiary.last_name.is_some() || beneficiary.first_name.is_some();
        let beneficiary = has_name.then(|| {
            beneficiary.with_provenance(
                ExtractionMethod::G28Beneficiary,
                self.policy.beneficiary_confidence,
            )
        });

        Some(G28Extraction {
            representative: representative
                .with_provenance(ExtractionMethod::PdfFormFields, score),
            beneficiary,
        })
    }

    async fn try_ocr_pattern(&self, input: &DocumentInput) -> Option<G28Extraction> {
        let text = match self.ocr.recognize(input).await {
            Ok(text) => text,
            Err(e) => {
                warn!("G-28 OCR failed: {e:#}");
                return None;
            }
        };
        if text.trim().is_empty() {
            return None;
        }

        let representative = pattern::representative_from_text(&text);
        let score = representative_score(&representative);
        if score <= self.policy.accept_threshold {
            return None;
        }

        Some(G28Extraction {
            representative: representative.with_provenance(ExtractionMethod::OcrPattern, score),
            beneficiary: None,
        })
    }
}

/// Skip blanks and the "N/A" the form's template pre-fills.
fn clean_form_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Explicit form-field-name → record-field mapping for the current G-28
/// revision. Unknown names never match.
fn apply_representative_field(rec: &mut RepresentativeRecord, key: &str, value: String) {
    match key {
        "Pt1Line2a_FamilyName[0]" => rec.last_name = Some(value),
        "Pt1Line2b_GivenName[0]" => rec.first_name = Some(value),
        "Pt1Line2c_MiddleName[0]" => rec.middle_name = Some(value),
        "Line3a_StreetNumber[0]" => rec.street_address = Some(value),
        "Line3b_AptSteFlrNumber[0]" => rec.apt_ste_flr = Some(value),
        "Line3c_CityOrTown[0]" => rec.city = Some(value),
        "Line3d_State[0]" => rec.state = Some(crate::normalize::normalize_state(&value)),
        "Line3e_ZipCode[0]" => rec.zip_code = Some(value),
        "Line3h_Country[0]" => rec.country = Some(value),
        "Line4_DaytimeTelephoneNumber[0]" => rec.daytime_phone = Some(value),
        "Line7_MobileTelephoneNumber[0]" => rec.mobile_phone = Some(value),
        "Line6_EMail[0]" => {
            rec.email = crate::normalize::normalize_email(&value).or(Some(value.to_lowercase()))
        }
        "Pt2Line1a_LicensingAuthority[0]" => rec.licensing_authority = Some(value),
        "Pt2Line1b_BarNumber[0]" => rec.bar_number = Some(value),
        "Pt2Line1d_NameofFirmOrOrganization[0]" => rec.law_firm_name = Some(value),
        _ => {}
    }
}

/// Beneficiary (case subject) name fields on Part 3 of the form.
fn apply_beneficiary_field(rec: &mut PassportRecord, key: &str, value: String) {
    match key {
        "Pt3Line5a_FamilyName[0]" => rec.last_name = Some(value),
        "Pt3Line5b_GivenName[0]" => rec.first_name = Some(value),
        "Pt3Line5c_MiddleName[0]" => rec.middle_name = Some(value),
        _ => {}
    }
}
