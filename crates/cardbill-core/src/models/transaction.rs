//! Transaction data models for credit card bill extraction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical textual date format of a normalized record.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// A transaction line as captured from raw text.
///
/// All fields are literal substrings of the source line; nothing is validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Date text, e.g. `15/03/23`.
    #[serde(rename = "Date")]
    pub date: String,

    /// Text between the date and the amount.
    #[serde(rename = "Description")]
    pub description: String,

    /// Amount text including any currency marker, e.g. `Rs. 1,250.50`.
    #[serde(rename = "Amount")]
    pub amount: String,
}

impl RawTransaction {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount: amount.into(),
        }
    }

    /// True when every column is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.date.trim().is_empty()
            && self.description.trim().is_empty()
            && self.amount.trim().is_empty()
    }
}

/// A validated transaction with a calendar date and a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction date, serialized as `YYYY-MM-DD`.
    #[serde(rename = "Date")]
    pub date: NaiveDate,

    /// Merchant or transaction description.
    #[serde(rename = "Description")]
    pub description: String,

    /// Signed amount, serialized as a JSON number.
    #[serde(rename = "Amount", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl TransactionRecord {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
        }
    }

    /// Date in canonical `YYYY-MM-DD` form.
    pub fn date_string(&self) -> String {
        self.date.format(CANONICAL_DATE_FORMAT).to_string()
    }

    /// Render back into raw columns (canonical date, plain decimal amount).
    pub fn to_raw(&self) -> RawTransaction {
        RawTransaction::new(
            self.date_string(),
            self.description.clone(),
            self.amount.to_string(),
        )
    }
}

/// Ordered transactions in the order they appear in the source document.
///
/// Duplicates are legal: two charges of the same amount on the same day are two rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionTable {
    records: Vec<TransactionRecord>,
}

impl TransactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TransactionRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransactionRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// First `n` rows, for previews.
    pub fn head(&self, n: usize) -> &[TransactionRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Sum of the `Amount` column, or `None` if it exceeds the decimal range.
    pub fn total_amount(&self) -> Option<Decimal> {
        self.records
            .iter()
            .try_fold(Decimal::ZERO, |total, r| total.checked_add(r.amount))
    }

    /// Display-only summary: row count and amount total.
    pub fn summary(&self) -> TableSummary {
        TableSummary {
            transactions: self.len(),
            total_amount: self.total_amount(),
        }
    }

    /// Raw rows suitable for feeding back through the normalizer.
    pub fn to_raw_rows(&self) -> Vec<RawTransaction> {
        self.records.iter().map(TransactionRecord::to_raw).collect()
    }
}

impl From<Vec<TransactionRecord>> for TransactionTable {
    fn from(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<TransactionRecord> for TransactionTable {
    fn from_iter<I: IntoIterator<Item = TransactionRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TransactionTable {
    type Item = &'a TransactionRecord;
    type IntoIter = std::slice::Iter<'a, TransactionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for TransactionTable {
    type Item = TransactionRecord;
    type IntoIter = std::vec::IntoIter<TransactionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Summary values shown next to an extracted table. Not part of any file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Number of transactions in the table.
    pub transactions: usize,
    /// Sum of all amounts; `None` when the sum overflows.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(day: u32, amount: &str) -> TransactionRecord {
        TransactionRecord::new(
            NaiveDate::from_ymd_opt(2023, 3, day).unwrap(),
            "Shop",
            Decimal::from_str(amount).unwrap(),
        )
    }

    #[test]
    fn test_total_amount() {
        let table: TransactionTable = vec![record(1, "100.00"), record(2, "250.50")].into();

        let summary = table.summary();
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.total_amount, Some(Decimal::from_str("350.50").unwrap()));
    }

    #[test]
    fn test_empty_table_summary() {
        let summary = TransactionTable::new().summary();
        assert_eq!(summary.transactions, 0);
        assert_eq!(summary.total_amount, Some(Decimal::ZERO));
    }

    #[test]
    fn test_total_amount_overflow_is_none() {
        let huge = "50000000000000000000000000000";
        let table: TransactionTable = vec![record(1, huge), record(2, huge)].into();

        let summary = table.summary();
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.total_amount, None);

        let single: TransactionTable = vec![record(1, huge)].into();
        assert_eq!(single.total_amount(), Some(Decimal::from_str(huge).unwrap()));
    }

    #[test]
    fn test_blank_raw_row() {
        assert!(RawTransaction::new(" ", "", "\t").is_blank());
        assert!(!RawTransaction::new("", "", "100").is_blank());
    }

    #[test]
    fn test_record_to_raw_uses_canonical_date() {
        let raw = record(15, "-42.10").to_raw();
        assert_eq!(raw.date, "2023-03-15");
        assert_eq!(raw.amount, "-42.10");
    }

    #[test]
    fn test_record_json_columns() {
        let json = serde_json::to_value(record(15, "1250.50")).unwrap();
        assert_eq!(json["Date"], "2023-03-15");
        assert_eq!(json["Description"], "Shop");
        assert_eq!(json["Amount"], 1250.5);
    }

    #[test]
    fn test_head_clamps() {
        let table: TransactionTable = vec![record(1, "1")].into();
        assert_eq!(table.head(5).len(), 1);
    }
}
