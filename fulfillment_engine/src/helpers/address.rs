use once_cell::sync::Lazy;
use regex::Regex;

static UK_POSTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2}$").expect("Invalid UK postcode regex"));

/// Maps the country names the storefront sends to ISO 3166 alpha-2 codes. Anything already looking like a code is
/// upper-cased and passed through.
pub fn normalize_country(country: &str) -> String {
    let trimmed = country.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "united kingdom" | "uk" | "great britain" | "england" | "scotland" | "wales" | "northern ireland" => {
            "GB".to_string()
        },
        "united states" | "united states of america" | "usa" => "US".to_string(),
        "ireland" => "IE".to_string(),
        _ if trimmed.len() == 2 => trimmed.to_ascii_uppercase(),
        _ => trimmed.to_string(),
    }
}

/// UK postcodes need the single space before the inward code, e.g. `bs207bt` becomes `BS20 7BT`. Postcodes for other
/// countries are only trimmed.
pub fn normalize_postcode(postcode: &str, country_code: &str) -> String {
    if country_code != "GB" {
        return postcode.trim().to_string();
    }
    let compact = postcode.split_whitespace().collect::<String>().to_ascii_uppercase();
    if compact.len() < 5 {
        return compact;
    }
    let (outward, inward) = compact.split_at(compact.len() - 3);
    format!("{outward} {inward}")
}

pub fn is_valid_uk_postcode(postcode: &str) -> bool {
    UK_POSTCODE.is_match(postcode)
}
