use crate::error::PaymentError;
use serde::Serialize;
use std::fmt;

/// International dialling code every submitted number must carry.
pub const COUNTRY_CODE: &str = "254";

const NATIONAL_PREFIXES: [&str; 2] = ["07", "01"];
const NATIONAL_LEN: usize = 10;
const INTERNATIONAL_LEN: usize = 12;

/// A mobile number in canonical international form, e.g. `254712345678`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validates a user-entered number and normalizes it.
    ///
    /// Accepts national numbers (`07XXXXXXXX`, `01XXXXXXXX`) and international
    /// ones (`2547XXXXXXXX`, optionally written with a leading `+`). Spaces and
    /// hyphens are ignored.
    pub fn parse(raw: &str) -> Result<Self, PaymentError> {
        let cleaned = clean(raw);
        let digits_only = !cleaned.is_empty() && cleaned.bytes().all(|b| b.is_ascii_digit());

        let recognized = digits_only
            && ((NATIONAL_PREFIXES.iter().any(|p| cleaned.starts_with(p))
                && cleaned.len() == NATIONAL_LEN)
                || (cleaned.starts_with(COUNTRY_CODE) && cleaned.len() == INTERNATIONAL_LEN));

        if !recognized {
            return Err(PaymentError::InvalidPhoneFormat(format!(
                "'{}' is not a recognized mobile number",
                raw.trim()
            )));
        }

        Ok(Self(normalize(&cleaned)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn clean(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    match cleaned.strip_prefix('+') {
        Some(rest) => rest.to_string(),
        None => cleaned,
    }
}

/// Rewrites a number into its international form.
///
/// A national `07`/`01` prefix loses its leading zero in favour of the country
/// code. Anything else is taken as international and only gets the country
/// code prepended when it does not already start with it.
pub fn normalize(raw: &str) -> String {
    let cleaned = clean(raw);
    if NATIONAL_PREFIXES.iter().any(|p| cleaned.starts_with(p)) {
        return format!("{}{}", COUNTRY_CODE, &cleaned[1..]);
    }
    if cleaned.starts_with(COUNTRY_CODE) {
        cleaned
    } else {
        format!("{}{}", COUNTRY_CODE, cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_national_number_is_rewritten() {
        let phone = PhoneNumber::parse("0712345678").unwrap();
        assert_eq!(phone.as_str(), "254712345678");

        let phone = PhoneNumber::parse("0112345678").unwrap();
        assert_eq!(phone.as_str(), "254112345678");
    }

    #[test]
    fn test_formatting_characters_are_ignored() {
        let phone = PhoneNumber::parse(" 0712 345-678 ").unwrap();
        assert_eq!(phone.as_str(), "254712345678");

        let phone = PhoneNumber::parse("+254 712 345 678").unwrap();
        assert_eq!(phone.as_str(), "254712345678");
    }

    #[test]
    fn test_unrecognized_numbers_are_rejected() {
        for raw in ["", "12345", "0812345678", "07123", "2547123456789", "07123abcde"] {
            assert!(
                matches!(
                    PhoneNumber::parse(raw),
                    Err(PaymentError::InvalidPhoneFormat(_))
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_normalize_prefixes_missing_country_code() {
        assert_eq!(normalize("712345678"), "254712345678");
        assert_eq!(normalize("254712345678"), "254712345678");
    }
}
