//! Regex patterns for credit card bill lines.
//!
//! Digit classes are spelled `[0-9]` so OCR output in other scripts never
//! reaches decimal coercion.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // DD/MM/YYYY or DD/MM/YY, lexical only. Four-digit years first so a full
    // year is not cut down to its first two digits.
    pub static ref LINE_DATE: Regex = Regex::new(
        r"[0-9]{2}/[0-9]{2}/(?:[0-9]{4}|[0-9]{2})"
    ).unwrap();

    // Optional Rs / Rs. / ₹ marker, optional whitespace, digits and commas,
    // optional decimal point with up to two digits.
    pub static ref LINE_AMOUNT: Regex = Regex::new(
        r"(?:Rs\.?|₹)?\s*[0-9][0-9,]*(?:\.[0-9]{0,2})?"
    ).unwrap();

    // Currency marker at the start of a captured amount.
    pub static ref CURRENCY_PREFIX: Regex = Regex::new(
        r"^\s*(?:Rs\.?|₹)"
    ).unwrap();

    // Everything that is not part of a plain signed decimal.
    pub static ref AMOUNT_NOISE: Regex = Regex::new(
        r"[^0-9.\-]"
    ).unwrap();

    pub static ref PLAIN_DECIMAL: Regex = Regex::new(
        r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$"
    ).unwrap();

    // Normalizer date formats.
    pub static ref DATE_DMY_LONG: Regex = Regex::new(
        r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})$"
    ).unwrap();

    pub static ref DATE_DMY_SHORT: Regex = Regex::new(
        r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{2})$"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_date_prefers_four_digit_year() {
        let m = LINE_DATE.find("on 15/03/2023 paid").unwrap();
        assert_eq!(m.as_str(), "15/03/2023");

        let m = LINE_DATE.find("15/03/23 paid").unwrap();
        assert_eq!(m.as_str(), "15/03/23");
    }

    #[test]
    fn test_line_date_needs_two_digit_day_and_month() {
        assert!(LINE_DATE.find("5/3/23").is_none());
    }

    #[test]
    fn test_line_amount_with_markers() {
        assert_eq!(LINE_AMOUNT.find("Rs. 1,250.50").unwrap().as_str(), "Rs. 1,250.50");
        assert_eq!(LINE_AMOUNT.find("₹999").unwrap().as_str(), "₹999");
        assert_eq!(LINE_AMOUNT.find("Rs 12.5").unwrap().as_str(), "Rs 12.5");
    }

    #[test]
    fn test_line_amount_ignores_bare_commas() {
        assert_eq!(LINE_AMOUNT.find("Foo, Bar 10").unwrap().as_str(), " 10");
    }

    #[test]
    fn test_plain_decimal() {
        assert!(PLAIN_DECIMAL.is_match("1250.50"));
        assert!(PLAIN_DECIMAL.is_match("-15"));
        assert!(PLAIN_DECIMAL.is_match(".5"));
        assert!(PLAIN_DECIMAL.is_match("7."));
        assert!(!PLAIN_DECIMAL.is_match("1.2.3"));
        assert!(!PLAIN_DECIMAL.is_match("-"));
        assert!(!PLAIN_DECIMAL.is_match(""));
        assert!(!PLAIN_DECIMAL.is_match("5-"));
    }
}
