//! Confidence scoring for partially-populated records.
//!
//! Representative records are scored from field presence. Passport records
//! carry fixed per-strategy constants instead (see [`crate::config::Policy`]):
//! a validated MRZ or a successful vision-LLM read is itself the trust signal,
//! so recomputing from field presence would only add noise.

use crate::record::RepresentativeRecord;

/// Score a representative record in [0.0, 1.0]: half the weight on the
/// required name fields, half on the important contact fields.
pub fn representative_score(rec: &RepresentativeRecord) -> f64 {
    let required = [rec.last_name.as_deref(), rec.first_name.as_deref()];
    let important = [
        rec.street_address.as_deref(),
        rec.city.as_deref(),
        rec.state.as_deref(),
        rec.email.as_deref(),
    ];

    let req_score = present_fraction(&required) * 0.5;
    let imp_score = present_fraction(&important) * 0.5;

    (req_score + imp_score).min(1.0)
}

fn present_fraction(fields: &[Option<&str>]) -> f64 {
    let present = fields.iter().filter(|f| f.is_some()).count();
    present as f64 / fields.len() as f64
}
