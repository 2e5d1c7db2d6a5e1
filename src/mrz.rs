//! Machine-readable zone (TD3) locator and parser.
//!
//! Finds candidate MRZ line pairs inside raw OCR text, repairs them to the
//! fixed 44-character width, validates the ICAO Doc 9303 check digits, and
//! maps the validated fields into a [`PassportRecord`]. Validation is all or
//! nothing: a pair that fails any check digit is reported as "not found",
//! never as a partially-filled record.

use chrono::{Datelike, Utc};
use tracing::debug;

use crate::normalize::title_case;
use crate::record::{PassportRecord, Sex};
use crate::reference;

/// TD3 lines are exactly 44 characters.
const MRZ_WIDTH: usize = 44;
/// Cleaned candidates must land in this range before pad/truncate repair.
const CANDIDATE_MIN: usize = 42;
const CANDIDATE_MAX: usize = 46;
const FILLER: char = '<';

/// Raw fixed-width MRZ tokens, before any normalization. Intermediate only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzFieldSet {
    pub surname: String,
    pub given_names: String,
    pub document_number: String,
    pub country: String,
    pub nationality: String,
    pub birth_date: String,
    pub sex: String,
    pub expiry_date: String,
}

/// Parse a passport record out of raw OCR text, or `None` when no validated
/// MRZ is present. Provenance is left unset; the orchestrator attaches it.
pub fn parse(text: &str) -> Option<PassportRecord> {
    let (line1, line2) = locate(text)?;
    if !validate_td3(&line1, &line2) {
        debug!("MRZ candidate pair failed check-digit validation");
        return None;
    }
    let fields = MrzFieldSet::from_pair(&line1, &line2);
    let pivot = (Utc::now().year() % 100) as u32;
    Some(map_fields(&fields, pivot))
}

/// Find the MRZ line pair: clean every line, keep plausible candidates,
/// normalize each to 44 characters, and take the first two in document
/// order. Fewer than two candidates means no MRZ.
pub fn locate(text: &str) -> Option<(String, String)> {
    let mut candidates = text.lines().filter_map(candidate);
    let first = candidates.next()?;
    let second = candidates.next()?;
    Some((first, second))
}

fn candidate(line: &str) -> Option<String> {
    let cleaned = clean_line(line);
    if (CANDIDATE_MIN..=CANDIDATE_MAX).contains(&cleaned.len()) {
        Some(normalize_line(cleaned))
    } else {
        None
    }
}

/// Strip spaces, map look-alike glyphs to the filler character, and drop
/// anything outside the MRZ alphabet (`A-Z`, `0-9`, `<`).
fn clean_line(line: &str) -> String {
    line.to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '«' | '‹' | '»' | '›' => FILLER,
            other => other,
        })
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == FILLER)
        .collect()
}

/// Repair a candidate to exactly 44 characters: right-pad with filler when
/// short, truncate when long. Idempotent on already-44-character lines.
fn normalize_line(mut line: String) -> String {
    if line.len() < MRZ_WIDTH {
        line.extend(std::iter::repeat(FILLER).take(MRZ_WIDTH - line.len()));
    } else {
        line.truncate(MRZ_WIDTH);
    }
    line
}

// ── ICAO Doc 9303 check digits ──────────────────────────────────────────────

fn char_value(c: char) -> u32 {
    match c {
        '0'..='9' => c as u32 - '0' as u32,
        'A'..='Z' => c as u32 - 'A' as u32 + 10,
        _ => 0, // filler
    }
}

fn check_digit(field: &str) -> u32 {
    const WEIGHTS: [u32; 3] = [7, 3, 1];
    field
        .chars()
        .enumerate()
        .map(|(i, c)| char_value(c) * WEIGHTS[i % 3])
        .sum::<u32>()
        % 10
}

fn digit_at(line: &str, idx: usize) -> Option<u32> {
    line.chars().nth(idx)?.to_digit(10)
}

/// Validate a TD3 pair: document type, then the document-number, birth-date,
/// expiry-date, optional-data, and composite check digits.
pub fn validate_td3(line1: &str, line2: &str) -> bool {
    if line1.len() != MRZ_WIDTH || line2.len() != MRZ_WIDTH {
        return false;
    }
    if !line1.starts_with('P') {
        return false;
    }

    let doc_ok = digit_at(line2, 9) == Some(check_digit(&line2[0..9]));
    let birth_ok = digit_at(line2, 19) == Some(check_digit(&line2[13..19]));
    let expiry_ok = digit_at(line2, 27) == Some(check_digit(&line2[21..27]));

    // The optional-data check digit may be the filler when the field is zero.
    let personal_expected = check_digit(&line2[28..42]);
    let personal_actual = line2.chars().nth(42);
    let personal_ok = personal_actual.and_then(|c| c.to_digit(10)) == Some(personal_expected)
        || (personal_actual == Some(FILLER) && personal_expected == 0);

    let composite = format!("{}{}{}", &line2[0..10], &line2[13..20], &line2[21..43]);
    let composite_ok = digit_at(line2, 43) == Some(check_digit(&composite));

    doc_ok && birth_ok && expiry_ok && personal_ok && composite_ok
}

// ── Field extraction ────────────────────────────────────────────────────────

impl MrzFieldSet {
    /// Slice the raw fixed-width tokens out of a validated pair.
    pub fn from_pair(line1: &str, line2: &str) -> Self {
        let names = &line1[5..MRZ_WIDTH];
        let (surname, given_names) = match names.split_once("<<") {
            Some((s, g)) => (s.to_string(), g.to_string()),
            None => (names.to_string(), String::new()),
        };

        Self {
            surname,
            given_names,
            document_number: line2[0..9].to_string(),
            country: line1[2..5].to_string(),
            nationality: line2[10..13].to_string(),
            birth_date: line2[13..19].to_string(),
            sex: line2[20..21].to_string(),
            expiry_date: line2[21..27].to_string(),
        }
    }
}

fn map_fields(fields: &MrzFieldSet, pivot: u32) -> PassportRecord {
    let surname = strip_filler(&fields.surname);
    let given = strip_filler(&fields.given_names);
    let mut parts = given.split_whitespace();
    let first_name = parts.next().map(title_case);
    let middle: Vec<&str> = parts.collect();
    let middle_name = if middle.is_empty() {
        None
    } else {
        Some(title_case(&middle.join(" ")))
    };

    let passport_number = {
        let n = fields.document_number.trim_matches(FILLER);
        if n.is_empty() {
            None
        } else {
            Some(n.to_string())
        }
    };

    PassportRecord {
        last_name: if surname.is_empty() {
            None
        } else {
            Some(title_case(&surname))
        },
        first_name,
        middle_name,
        passport_number,
        country_of_issue: resolve_country(&fields.country),
        nationality: resolve_country(&fields.nationality),
        date_of_birth: mrz_date(&fields.birth_date, pivot),
        sex: Sex::parse(&fields.sex),
        date_of_expiration: mrz_date(&fields.expiry_date, pivot),
        ..Default::default()
    }
}

fn strip_filler(token: &str) -> String {
    token.replace(FILLER, " ").trim().to_string()
}

/// Resolve a 3-letter code via the reference table, falling back to the raw
/// code when unmapped.
fn resolve_country(code: &str) -> Option<String> {
    let code = code.trim_matches(FILLER);
    if code.is_empty() {
        return None;
    }
    Some(
        reference::country_name(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string()),
    )
}

/// Convert a 6-digit `YYMMDD` token to ISO, disambiguating the century
/// against `pivot` (current year mod 100): `yy > pivot + 10` reads as the
/// 1900s, anything else as the 2000s. Malformed digits yield `None`.
pub fn mrz_date(raw: &str, pivot: u32) -> Option<String> {
    if raw.len() < 6 || !raw[..6].chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let yy: u32 = raw[0..2].parse().ok()?;
    let mm: u32 = raw[2..4].parse().ok()?;
    let dd: u32 = raw[4..6].parse().ok()?;
    let year = if yy > pivot + 10 { 1900 + yy } else { 2000 + yy };
    let date = chrono::NaiveDate::from_ymd_opt(year as i32, mm, dd)?;
    Some(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ICAO Doc 9303 specimen document.
    const LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    #[test]
    fn normalize_is_idempotent_on_full_width_lines() {
        assert_eq!(normalize_line(LINE1.to_string()), LINE1);
        assert_eq!(normalize_line(LINE2.to_string()), LINE2);
    }

    #[test]
    fn normalize_pads_short_and_truncates_long() {
        let padded = normalize_line(LINE2[..42].to_string());
        assert_eq!(padded.len(), 44);
        assert!(padded.ends_with("<<"));

        let long = format!("{}XX", LINE2);
        assert_eq!(normalize_line(long), LINE2);
    }

    #[test]
    fn clean_line_maps_lookalike_glyphs_and_strips_noise() {
        let noisy = "l898902c36uto74 08122f1204159ze184226b«««««10";
        assert_eq!(clean_line(noisy), LINE2);
    }

    #[test]
    fn specimen_pair_validates() {
        assert!(validate_td3(LINE1, LINE2));
    }

    #[test]
    fn corrupted_check_digit_fails_validation() {
        // Flip the final composite digit.
        let mut corrupt = LINE2[..43].to_string();
        corrupt.push('1');
        assert!(!validate_td3(LINE1, &corrupt));

        // Flip one document-number digit; its check digit no longer matches.
        let corrupt = format!("L898903C36{}", &LINE2[10..]);
        assert!(!validate_td3(LINE1, &corrupt));
    }

    #[test]
    fn parse_recovers_specimen_fields_exactly() {
        let text = format!("PASSPORT\nsome header noise\n{}\n{}\n", LINE1, LINE2);
        let rec = parse(&text).expect("specimen should parse");
        assert_eq!(rec.passport_number.as_deref(), Some("L898902C3"));
        assert_eq!(rec.last_name.as_deref(), Some("Eriksson"));
        assert_eq!(rec.first_name.as_deref(), Some("Anna"));
        assert_eq!(rec.middle_name.as_deref(), Some("Maria"));
        assert_eq!(rec.sex, Some(Sex::F));
        assert_eq!(rec.date_of_birth.as_deref(), Some("1974-08-12"));
        assert_eq!(rec.date_of_expiration.as_deref(), Some("2012-04-15"));
        // UTO is not a real ISO code; falls back to the raw code.
        assert_eq!(rec.country_of_issue.as_deref(), Some("UTO"));
        assert_eq!(rec.nationality.as_deref(), Some("UTO"));
        // Provenance is the orchestrator's job.
        assert_eq!(rec.extraction_method, None);
        assert_eq!(rec.confidence_score, None);
    }

    #[test]
    fn corrupted_pair_parses_as_not_found_never_partial() {
        let corrupt = format!("L898902C37{}", &LINE2[10..]);
        let text = format!("{}\n{}\n", LINE1, corrupt);
        assert_eq!(parse(&text), None);
    }

    #[test]
    fn fewer_than_two_candidates_is_not_found() {
        assert_eq!(locate("just a short line\nPASSPORT\n"), None);
        assert_eq!(locate(&format!("{}\nshort", LINE1)), None);
    }

    #[test]
    fn pivot_rule_disambiguates_century() {
        // pivot 24: 30 <= 34 so 2030; 70 > 34 so 1970.
        assert_eq!(mrz_date("300101", 24).as_deref(), Some("2030-01-01"));
        assert_eq!(mrz_date("700101", 24).as_deref(), Some("1970-01-01"));
        // Exact boundary yy == pivot + 10 resolves to the 2000s branch.
        assert_eq!(mrz_date("340101", 24).as_deref(), Some("2034-01-01"));
    }

    #[test]
    fn malformed_date_is_unset_not_an_error() {
        assert_eq!(mrz_date("AB0101", 24), None);
        assert_eq!(mrz_date("9913", 24), None);
        // Day out of range for the month.
        assert_eq!(mrz_date("900231", 24), None);
    }
}
