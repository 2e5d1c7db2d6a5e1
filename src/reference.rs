//! Static reference tables: ISO-3166 alpha-3 country codes and US states.

/// ISO-3166 alpha-3 code → country name, covering the issuing countries we
/// see in practice. Unmapped codes fall back to the raw code at the call
/// site rather than failing the record.
static COUNTRY_CODES: &[(&str, &str)] = &[
    ("USA", "United States"),
    ("GBR", "United Kingdom"),
    ("CAN", "Canada"),
    ("AUS", "Australia"),
    ("DEU", "Germany"),
    ("FRA", "France"),
    ("ITA", "Italy"),
    ("ESP", "Spain"),
    ("JPN", "Japan"),
    ("CHN", "China"),
    ("IND", "India"),
    ("BRA", "Brazil"),
    ("MEX", "Mexico"),
    ("KOR", "South Korea"),
    ("RUS", "Russia"),
    ("NLD", "Netherlands"),
    ("BEL", "Belgium"),
    ("CHE", "Switzerland"),
    ("AUT", "Austria"),
    ("SWE", "Sweden"),
    ("NOR", "Norway"),
    ("DNK", "Denmark"),
    ("FIN", "Finland"),
    ("POL", "Poland"),
    ("PRT", "Portugal"),
    ("GRC", "Greece"),
    ("IRL", "Ireland"),
    ("NZL", "New Zealand"),
    ("SGP", "Singapore"),
    ("HKG", "Hong Kong"),
    ("TWN", "Taiwan"),
    ("THA", "Thailand"),
    ("VNM", "Vietnam"),
    ("PHL", "Philippines"),
    ("IDN", "Indonesia"),
    ("MYS", "Malaysia"),
    ("ARG", "Argentina"),
    ("CHL", "Chile"),
    ("COL", "Colombia"),
    ("PER", "Peru"),
    ("ZAF", "South Africa"),
    ("EGY", "Egypt"),
    ("NGA", "Nigeria"),
    ("KEN", "Kenya"),
    ("ISR", "Israel"),
    ("ARE", "United Arab Emirates"),
    ("SAU", "Saudi Arabia"),
    ("TUR", "Turkey"),
    ("PAK", "Pakistan"),
    ("BGD", "Bangladesh"),
];

/// US state / district names and their 2-letter codes.
static US_STATES: &[(&str, &str)] = &[
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("district of columbia", "DC"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

/// Resolve an ISO-3166 alpha-3 code to a country name.
pub fn country_name(code: &str) -> Option<&'static str> {
    let code = code.trim().to_uppercase();
    COUNTRY_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Resolve a state name or 2-letter abbreviation to its canonical code.
pub fn state_code(state: &str) -> Option<&'static str> {
    let lower = state.trim().to_lowercase();
    US_STATES
        .iter()
        .find(|(name, code)| *name == lower || code.to_lowercase() == lower)
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_lookup() {
        assert_eq!(country_name("USA"), Some("United States"));
        assert_eq!(country_name("deu"), Some("Germany"));
        assert_eq!(country_name("UTO"), None);
    }

    #[test]
    fn state_lookup_by_name_and_code() {
        assert_eq!(state_code("California"), Some("CA"));
        assert_eq!(state_code("ca"), Some("CA"));
        assert_eq!(state_code("district of columbia"), Some("DC"));
        assert_eq!(state_code("Ontario"), None);
    }
}
