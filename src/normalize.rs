//! Pure field normalization helpers: dates, states, names, emails.

use chrono::NaiveDate;

use crate::reference;

/// Date formats we accept from OCR text and form fields, tried in order.
/// US month-first forms come before day-first so `03/04/1990` resolves the
/// way the source forms print it.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%m/%d/%y",
    "%m-%d-%y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Normalize a free-form date to ISO `YYYY-MM-DD`. Unparseable input is
/// passed through unchanged so a readable raw value is never discarded.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    trimmed.to_string()
}

/// Canonicalize a state name or abbreviation to a 2-letter code.
/// Unknown values degrade to the uppercased first two characters.
pub fn normalize_state(raw: &str) -> String {
    match reference::state_code(raw) {
        Some(code) => code.to_string(),
        None => raw.trim().to_uppercase().chars().take(2).collect(),
    }
}

/// Title-case a name: uppercase each letter that follows a non-letter,
/// lowercase the rest. Handles hyphenated and apostrophe names.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for c in raw.trim().chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Lowercase an email address after a minimal syntax check. Values that do
/// not look like an address are rejected rather than stored.
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (local, domain) = trimmed.split_once('@')?;
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
    {
        return None;
    }
    Some(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_formats_resolve_to_iso() {
        assert_eq!(normalize_date("03/04/1990"), "1990-03-04");
        assert_eq!(normalize_date("25/12/1990"), "1990-12-25");
        assert_eq!(normalize_date("12 March 1985"), "1985-03-12");
        assert_eq!(normalize_date("Jan 5, 2001"), "2001-01-05");
        assert_eq!(normalize_date("1990-03-04"), "1990-03-04");
    }

    #[test]
    fn unparseable_date_passes_through() {
        assert_eq!(normalize_date("sometime in spring"), "sometime in spring");
    }

    #[test]
    fn state_canonicalization() {
        assert_eq!(normalize_state("texas"), "TX");
        assert_eq!(normalize_state("TX"), "TX");
        assert_eq!(normalize_state("Ontario"), "ON");
    }

    #[test]
    fn title_case_names() {
        assert_eq!(title_case("SILVA"), "Silva");
        assert_eq!(title_case("maria da costa"), "Maria Da Costa");
        assert_eq!(title_case("ANNE-MARIE O'BRIEN"), "Anne-Marie O'Brien");
    }

    #[test]
    fn email_normalization() {
        assert_eq!(
            normalize_email(" Jane@Example.COM "),
            Some("jane@example.com".to_string())
        );
        assert_eq!(normalize_email("not-an-email"), None);
        assert_eq!(normalize_email("jane@nodot"), None);
    }
}
