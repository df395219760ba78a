//! Line parser: one line of extracted text to an optional raw transaction.

use regex::Match;
use tracing::trace;

use super::patterns::{LINE_AMOUNT, LINE_DATE};
use crate::models::transaction::RawTransaction;

/// Parse a single line of bill text into `(date, description, amount)`.
///
/// The date is the first `DD/MM/YY` or `DD/MM/YYYY` substring. The amount is the
/// first amount-shaped substring anywhere in the line that does not lie inside
/// the date itself; it may come before the date. A digit run that starts inside
/// the date and continues past it is cut at the date's end, so `15/03/23,500`
/// yields the amount `500`. The description is the trimmed
/// text between the end of the date and the start of the amount, or empty when
/// the amount comes first.
///
/// Returns `None` when the line lacks either a date or an amount.
pub fn parse_transaction_line(line: &str) -> Option<RawTransaction> {
    let date = LINE_DATE.find(line)?;
    let amount = find_amount(line, &date)?;

    let description = if amount.start() >= date.end() {
        line[date.end()..amount.start()].trim()
    } else {
        ""
    };

    trace!(
        "line matched: date={:?} amount={:?} description={:?}",
        date.as_str(),
        amount.as_str(),
        description
    );

    Some(RawTransaction::new(
        date.as_str(),
        description,
        amount.as_str().trim(),
    ))
}

/// Apply [`parse_transaction_line`] to every line of `text`, keeping source order.
pub fn parse_transaction_lines(text: &str) -> Vec<RawTransaction> {
    text.lines().filter_map(parse_transaction_line).collect()
}

fn find_amount<'h>(line: &'h str, date: &Match<'_>) -> Option<Match<'h>> {
    for m in LINE_AMOUNT.find_iter(line) {
        if m.end() <= date.start() || m.start() >= date.end() {
            return Some(m);
        }
        // Matches don't overlap, so a run straddling the date's end hides what follows.
        if m.end() > date.end() {
            return LINE_AMOUNT.find_at(line, date.end());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grocery_line() {
        let parsed = parse_transaction_line("15/03/23 Grocery Store Rs. 1,250.50").unwrap();
        assert_eq!(parsed, RawTransaction::new("15/03/23", "Grocery Store", "Rs. 1,250.50"));
    }

    #[test]
    fn test_no_date_or_amount() {
        assert_eq!(parse_transaction_line("No date or amount here"), None);
    }

    #[test]
    fn test_date_without_amount() {
        assert_eq!(parse_transaction_line("Statement date 15/03/23"), None);
    }

    #[test]
    fn test_amount_without_date() {
        assert_eq!(parse_transaction_line("Total due Rs. 5,000.00"), None);
    }

    #[test]
    fn test_four_digit_year_and_rupee_sign() {
        let parsed = parse_transaction_line("02/01/2024  AMAZON PAY INDIA  ₹ 499.00").unwrap();
        assert_eq!(parsed.date, "02/01/2024");
        assert_eq!(parsed.description, "AMAZON PAY INDIA");
        assert_eq!(parsed.amount, "₹ 499.00");
    }

    #[test]
    fn test_plain_number_amount() {
        let parsed = parse_transaction_line("28/02/24 FUEL SURCHARGE 12.5").unwrap();
        assert_eq!(parsed.description, "FUEL SURCHARGE");
        assert_eq!(parsed.amount, "12.5");
    }

    #[test]
    fn test_fields_are_substrings() {
        let lines = [
            "15/03/23 Grocery Store Rs. 1,250.50",
            "  01/12/2022 Netflix 649",
            "Rs. 300 10/10/22 refund",
            "31/01/24 UPI-SWIGGY ₹1,024.75 CR",
        ];
        for line in lines {
            let parsed = parse_transaction_line(line).unwrap();
            assert!(line.contains(&parsed.date), "{line}");
            assert!(line.contains(&parsed.amount), "{line}");
        }
    }

    // Amount before the date leaves nothing between them.
    #[test]
    fn test_amount_before_date_gives_empty_description() {
        let parsed = parse_transaction_line("Rs. 300 10/10/22 refund").unwrap();
        assert_eq!(parsed.date, "10/10/22");
        assert_eq!(parsed.amount, "Rs. 300");
        assert_eq!(parsed.description, "");
    }

    #[test]
    fn test_first_number_after_date_wins() {
        let parsed = parse_transaction_line("05/06/23 ORDER 8812 Rs. 99.00").unwrap();
        assert_eq!(parsed.description, "ORDER");
        assert_eq!(parsed.amount, "8812");
    }

    #[test]
    fn test_amount_run_straddling_date_end() {
        let parsed = parse_transaction_line("15/03/23,500 X").unwrap();
        assert_eq!(parsed, RawTransaction::new("15/03/23", ",", "500"));

        let parsed = parse_transaction_line("15/03/2023,1,200.00 Fuel").unwrap();
        assert_eq!(parsed.date, "15/03/2023");
        assert_eq!(parsed.amount, "1,200.00");
    }

    #[test]
    fn test_parse_lines_keeps_order_and_skips_noise() {
        let text = "HDFC Bank Credit Card Statement\n\
                    15/03/23 Grocery Store Rs. 1,250.50\n\
                    Page 1 of 2\n\
                    16/03/23 Pharmacy Rs. 320.00\n";

        let rows = parse_transaction_lines(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "Grocery Store");
        assert_eq!(rows[1].description, "Pharmacy");
    }
}
