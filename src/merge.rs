//! Cross-document merge policy.
//!
//! Passport-sourced data outranks name fragments found on a representative
//! form, so the rule is first writer wins: later documents only fill gaps.

use crate::record::PassportRecord;

/// Fold a beneficiary-derived partial record into the case's passport slot.
/// With no existing record the beneficiary record is stored as-is; otherwise
/// only the unset name fields are filled and everything else is untouched.
pub fn merge_beneficiary(
    existing: Option<PassportRecord>,
    beneficiary: PassportRecord,
) -> PassportRecord {
    let Some(mut existing) = existing else {
        return beneficiary;
    };

    if existing.last_name.is_none() {
        existing.last_name = beneficiary.last_name;
    }
    if existing.first_name.is_none() {
        existing.first_name = beneficiary.first_name;
    }
    if existing.middle_name.is_none() {
        existing.middle_name = beneficiary.middle_name;
    }

    existing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ExtractionMethod;

    #[test]
    fn beneficiary_stored_as_is_when_no_passport_exists() {
        let beneficiary = PassportRecord {
            last_name: Some("Silva".to_string()),
            ..Default::default()
        }
        .with_provenance(ExtractionMethod::G28Beneficiary, 0.5);

        let merged = merge_beneficiary(None, beneficiary.clone());
        assert_eq!(merged, beneficiary);
    }

    #[test]
    fn fills_gaps_without_overwriting() {
        let existing = PassportRecord {
            first_name: Some("Ana".to_string()),
            last_name: None,
            passport_number: Some("X1234567".to_string()),
            ..Default::default()
        }
        .with_provenance(ExtractionMethod::Mrz, 0.95);

        let beneficiary = PassportRecord {
            first_name: Some("Maria".to_string()),
            last_name: Some("Silva".to_string()),
            ..Default::default()
        };

        let merged = merge_beneficiary(Some(existing), beneficiary);
        assert_eq!(merged.first_name.as_deref(), Some("Ana"));
        assert_eq!(merged.last_name.as_deref(), Some("Silva"));
        // Non-name fields and provenance are untouched by the merge.
        assert_eq!(merged.passport_number.as_deref(), Some("X1234567"));
        assert_eq!(merged.extraction_method, Some(ExtractionMethod::Mrz));
        assert_eq!(merged.confidence_score, Some(0.95));
    }
}
