//! Label-anchored pattern extraction for free-form OCR text.
//!
//! Each field carries an ordered pattern list; the first match wins and the
//! remaining patterns for that field are skipped. Extraction never fails —
//! fields that do not match simply stay unset. Patterns are compiled once
//! and reused across requests.

use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::{normalize_date, normalize_email, normalize_state, title_case};
use crate::record::{PassportRecord, RepresentativeRecord, Sex};

/// Captured label text that indicates a mis-anchored match rather than a
/// real value (e.g. "Last Name: Name" on a blank form).
const NAME_STOP_WORDS: &[&str] = &["name", "last", "first", "given", "family", "middle"];

struct PassportPatterns {
    /// Label-anchored pattern first, then two generic shape patterns,
    /// in that priority order.
    passport_number: Vec<Regex>,
    date_of_birth: Vec<Regex>,
    sex: Regex,
}

struct RepresentativePatterns {
    last_name: Regex,
    first_name: Regex,
    middle_name: Regex,
    street_address: Regex,
    city: Regex,
    state: Regex,
    zip_code: Regex,
    email: Regex,
    bar_number: Regex,
    licensing_authority: Regex,
    law_firm_name: Regex,
    whitespace: Regex,
    trailing_state: Regex,
}

fn passport_patterns() -> &'static PassportPatterns {
    static PATTERNS: OnceLock<PassportPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| PassportPatterns {
        passport_number: vec![
            Regex::new(r"(?i)passport\s*(?:no|number|#)?[:\s]*([A-Z0-9]{6,12})").unwrap(),
            Regex::new(r"\b([A-Z]{1,2}[0-9]{6,9})\b").unwrap(),
            Regex::new(r"\b([0-9]{9})\b").unwrap(),
        ],
        date_of_birth: vec![
            Regex::new(
                r"(?i)(?:date\s+of\s+birth|dob|birth\s*date)[:\s]*([0-9]{1,2}[-/][0-9]{1,2}[-/][0-9]{2,4})",
            )
            .unwrap(),
            Regex::new(
                r"(?i)(?:date\s+of\s+birth|dob|birth\s*date)[:\s]*([0-9]{1,2}\s+[A-Za-z]+\s+[0-9]{2,4})",
            )
            .unwrap(),
        ],
        sex: Regex::new(r"(?i)(?:sex|gender)[:\s]*(MALE|FEMALE|M|F|X)\b").unwrap(),
    })
}

fn representative_patterns() -> &'static RepresentativePatterns {
    static PATTERNS: OnceLock<RepresentativePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| RepresentativePatterns {
        last_name: Regex::new(r"(?i)(?:family\s*name|last\s*name)[^A-Za-z]*([A-Za-z][A-Za-z'-]+)")
            .unwrap(),
        first_name: Regex::new(r"(?i)(?:given\s*name|first\s*name)[^A-Za-z]*([A-Za-z][A-Za-z'-]+)")
            .unwrap(),
        middle_name: Regex::new(r"(?i)middle\s*name[^A-Za-z]*([A-Za-z][A-Za-z'-]*)").unwrap(),
        street_address: Regex::new(r"(?i)(?:street|address)[^A-Za-z0-9]*([0-9]+[^,\n]{5,50})")
            .unwrap(),
        // City names start uppercase and run until a comma or a trailing
        // state code; deliberately case-sensitive to avoid label echoes.
        city: Regex::new(r"(?:City|Town)[^A-Za-z]*([A-Z][A-Za-z\s]{2,30}?)(?:,|\s+[A-Z]{2}\s)")
            .unwrap(),
        state: Regex::new(r"State[^A-Za-z]*([A-Z]{2})\b").unwrap(),
        zip_code: Regex::new(r"(?i)(?:zip|postal)[^0-9]*([0-9]{5}(?:-[0-9]{4})?)").unwrap(),
        email: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
        bar_number: Regex::new(r"(?i)bar\s*number[^A-Za-z0-9]*([A-Z0-9]{4,12})").unwrap(),
        licensing_authority: Regex::new(
            r"(?i)licensing\s*authority[^A-Za-z]*([A-Za-z][A-Za-z\s]+?)(?:,|\.)",
        )
        .unwrap(),
        law_firm_name: Regex::new(r"(?i)(?:law\s*firm|organization)[^A-Za-z]*([A-Za-z][^,\n]{5,60})")
            .unwrap(),
        whitespace: Regex::new(r"\s+").unwrap(),
        trailing_state: Regex::new(r"\s+[A-Z]{2}$").unwrap(),
    })
}

fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|p| p.captures(text))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Best-effort passport fields from OCR text. Person names come from the
/// caller's entity-recognizer output (`persons`), since passport pages do
/// not label the holder's name in a pattern-friendly way.
pub fn passport_from_text(text: &str, persons: &[String]) -> PassportRecord {
    let patterns = passport_patterns();
    let mut record = PassportRecord::default();

    // Priority order: label-anchored first, generic shapes after.
    for pattern in &patterns.passport_number {
        if let Some(cap) = pattern.captures(text).and_then(|c| c.get(1)) {
            record.passport_number = Some(cap.as_str().to_uppercase());
            break;
        }
    }

    if let Some(person) = persons.first() {
        let parts: Vec<&str> = person.split_whitespace().collect();
        if parts.len() >= 2 {
            record.first_name = Some(parts[0].to_string());
            record.last_name = Some(parts[parts.len() - 1].to_string());
            if parts.len() > 2 {
                record.middle_name = Some(parts[1..parts.len() - 1].join(" "));
            }
        }
    }

    if let Some(raw) = first_capture(&patterns.date_of_birth, text) {
        record.date_of_birth = Some(normalize_date(raw));
    }

    if let Some(cap) = patterns.sex.captures(text).and_then(|c| c.get(1)) {
        record.sex = Sex::parse(cap.as_str());
    }

    record
}

/// Best-effort representative fields from OCR text.
pub fn representative_from_text(text: &str) -> RepresentativeRecord {
    let patterns = representative_patterns();
    let mut record = RepresentativeRecord::default();

    record.last_name = capture_name(&patterns.last_name, text);
    record.first_name = capture_name(&patterns.first_name, text);
    record.middle_name = capture_name(&patterns.middle_name, text);

    if let Some(cap) = patterns.street_address.captures(text).and_then(|c| c.get(1)) {
        let collapsed = patterns.whitespace.replace_all(cap.as_str().trim(), " ");
        record.street_address = Some(collapsed.chars().take(100).collect());
    }

    if let Some(cap) = patterns.city.captures(text).and_then(|c| c.get(1)) {
        // A trailing state code sometimes rides along with the city capture.
        let city = patterns.trailing_state.replace(cap.as_str().trim(), "");
        record.city = Some(city.to_string());
    }

    if let Some(cap) = patterns.state.captures(text).and_then(|c| c.get(1)) {
        record.state = Some(normalize_state(cap.as_str()));
    }

    if let Some(cap) = patterns.zip_code.captures(text).and_then(|c| c.get(1)) {
        record.zip_code = Some(cap.as_str().to_string());
    }

    if let Some(m) = patterns.email.find(text) {
        record.email = normalize_email(m.as_str());
    }

    if let Some(cap) = patterns.bar_number.captures(text).and_then(|c| c.get(1)) {
        record.bar_number = Some(cap.as_str().to_string());
    }

    if let Some(cap) = patterns
        .licensing_authority
        .captures(text)
        .and_then(|c| c.get(1))
    {
        record.licensing_authority = Some(title_case(cap.as_str().trim()));
    }

    if let Some(cap) = patterns.law_firm_name.captures(text).and_then(|c| c.get(1)) {
        let collapsed = patterns.whitespace.replace_all(cap.as_str().trim(), " ");
        record.law_firm_name = Some(collapsed.to_string());
    }

    // A resolved US state implies the country when nothing said otherwise.
    if record.country.is_none() && record.state.is_some() {
        record.country = Some("United States".to_string());
    }

    record
}

/// Capture a name value, discarding literal label words that indicate the
/// pattern anchored on an adjacent label instead of a filled-in value.
fn capture_name(pattern: &Regex, text: &str) -> Option<String> {
    let value = pattern.captures(text)?.get(1)?.as_str().trim();
    if NAME_STOP_WORDS.contains(&value.to_lowercase().as_str()) {
        return None;
    }
    Some(title_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passport_number_label_beats_generic_shapes() {
        let text = "Control 123456789\nPassport No: X1234567\n";
        let rec = passport_from_text(text, &[]);
        assert_eq!(rec.passport_number.as_deref(), Some("X1234567"));
    }

    #[test]
    fn passport_number_generic_shape_fallback() {
        let rec = passport_from_text("document ref AB1234567 on file", &[]);
        assert_eq!(rec.passport_number.as_deref(), Some("AB1234567"));
    }

    #[test]
    fn passport_person_name_split() {
        let rec = passport_from_text("no numbers here", &["Anna Maria Eriksson".to_string()]);
        assert_eq!(rec.first_name.as_deref(), Some("Anna"));
        assert_eq!(rec.middle_name.as_deref(), Some("Maria"));
        assert_eq!(rec.last_name.as_deref(), Some("Eriksson"));
    }

    #[test]
    fn passport_dob_and_sex() {
        let text = "Date of Birth: 04/12/1985\nSex: FEMALE\n";
        let rec = passport_from_text(text, &[]);
        assert_eq!(rec.date_of_birth.as_deref(), Some("1985-04-12"));
        assert_eq!(rec.sex, Some(Sex::F));
    }

    #[test]
    fn representative_full_extraction() {
        let text = "Family Name: Nguyen\nGiven Name: Linh\nStreet Address: 100 Main St Suite 4\n\
                    City: Austin, TX 78701\nState: TX\nZIP: 78701\nEmail: Linh@Firm.com\n\
                    Bar Number: TX12345\nLicensing Authority: State Bar of Texas,\n\
                    Law Firm: Nguyen Immigration Law\n";
        let rec = representative_from_text(text);
        assert_eq!(rec.last_name.as_deref(), Some("Nguyen"));
        assert_eq!(rec.first_name.as_deref(), Some("Linh"));
        assert_eq!(rec.state.as_deref(), Some("TX"));
        assert_eq!(rec.zip_code.as_deref(), Some("78701"));
        assert_eq!(rec.email.as_deref(), Some("linh@firm.com"));
        assert_eq!(rec.bar_number.as_deref(), Some("TX12345"));
        assert_eq!(rec.licensing_authority.as_deref(), Some("State Bar Of Texas"));
        assert_eq!(rec.law_firm_name.as_deref(), Some("Nguyen Immigration Law"));
        assert_eq!(rec.street_address.as_deref(), Some("100 Main St Suite 4"));
    }

    #[test]
    fn blank_form_label_echo_is_rejected() {
        let rec = representative_from_text("Last Name: Name\nFirst Name: Given\n");
        assert_eq!(rec.last_name, None);
        assert_eq!(rec.first_name, None);
    }

    #[test]
    fn us_state_implies_country() {
        let rec = representative_from_text("State: CA\n");
        assert_eq!(rec.state.as_deref(), Some("CA"));
        assert_eq!(rec.country.as_deref(), Some("United States"));
    }

    #[test]
    fn empty_text_stays_unset() {
        let rec = representative_from_text("");
        assert_eq!(rec, RepresentativeRecord::default());
    }
}
