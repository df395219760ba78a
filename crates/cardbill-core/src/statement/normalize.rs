//! Table normalizer: raw transaction rows to validated records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::patterns::{
    AMOUNT_NOISE, CURRENCY_PREFIX, DATE_DMY_LONG, DATE_DMY_SHORT, DATE_ISO, PLAIN_DECIMAL,
};
use crate::models::transaction::{RawTransaction, TransactionRecord, TransactionTable};

/// Two-digit years below this pivot are 20xx, the rest 19xx.
const TWO_DIGIT_YEAR_PIVOT: i32 = 69;

/// Non-fatal problem found while normalizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeWarning {
    /// Date values that matched none of the accepted formats.
    DateParse { values: Vec<String> },
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeWarning::DateParse { values } => {
                write!(f, "Some dates could not be parsed: {}", values.join(", "))
            }
        }
    }
}

/// Normalized table plus what happened to the rows that did not make it.
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    /// Surviving records in input order.
    pub table: TransactionTable,
    /// Rows handed to the normalizer.
    pub input_rows: usize,
    /// Rows discarded because every column was empty.
    pub blank_rows: usize,
    /// Rows whose amount could not be coerced to a decimal.
    pub invalid_amounts: usize,
    /// Rows whose date matched no accepted format.
    pub invalid_dates: usize,
    /// Non-blank rows dropped for an invalid amount or date.
    pub dropped_rows: usize,
    /// Non-fatal warnings for the caller to display.
    pub warnings: Vec<NormalizeWarning>,
}

/// Cleans and validates raw transaction rows.
#[derive(Debug, Clone)]
pub struct TableNormalizer {
    /// Accept `YYYY-MM-DD` in addition to the day-first bill formats.
    accept_iso_dates: bool,
}

impl TableNormalizer {
    pub fn new() -> Self {
        Self {
            accept_iso_dates: true,
        }
    }

    /// Set whether canonical ISO dates are accepted as input.
    pub fn with_iso_dates(mut self, accept: bool) -> Self {
        self.accept_iso_dates = accept;
        self
    }

    /// Normalize `rows`.
    ///
    /// Returns `None` when there is nothing to process (absent or zero rows).
    /// Invalid rows are dropped, never repaired; an empty table in the report
    /// means no row survived.
    pub fn normalize(&self, rows: Option<&[RawTransaction]>) -> Option<NormalizeReport> {
        let rows = rows.filter(|r| !r.is_empty())?;

        let mut report = NormalizeReport {
            input_rows: rows.len(),
            ..Default::default()
        };
        let mut unparsed_dates: Vec<String> = Vec::new();

        for row in rows {
            if row.is_blank() {
                report.blank_rows += 1;
                continue;
            }

            let amount = clean_amount(&row.amount);
            if amount.is_none() {
                report.invalid_amounts += 1;
            }

            let date = self.parse_date(&row.date);
            if date.is_none() {
                report.invalid_dates += 1;
                if !unparsed_dates.contains(&row.date) {
                    unparsed_dates.push(row.date.clone());
                }
            }

            match (date, amount) {
                (Some(date), Some(amount)) => {
                    report
                        .table
                        .push(TransactionRecord::new(date, row.description.clone(), amount));
                }
                _ => report.dropped_rows += 1,
            }
        }

        if !unparsed_dates.is_empty() {
            let warning = NormalizeWarning::DateParse {
                values: unparsed_dates,
            };
            warn!("{}", warning);
            report.warnings.push(warning);
        }

        debug!(
            "Normalized {} rows: {} kept, {} blank, {} dropped ({} bad amounts, {} bad dates)",
            report.input_rows,
            report.table.len(),
            report.blank_rows,
            report.dropped_rows,
            report.invalid_amounts,
            report.invalid_dates
        );

        Some(report)
    }

    /// Parse a bill date: day/month/4-digit year, then day/month/2-digit year,
    /// then (if enabled) ISO `YYYY-MM-DD`.
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let s = raw.trim();
        parse_day_month_long(s)
            .or_else(|| parse_day_month_short(s))
            .or_else(|| {
                if self.accept_iso_dates {
                    parse_iso(s)
                } else {
                    None
                }
            })
    }
}

impl Default for TableNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize raw rows with default settings.
///
/// `None` means there was nothing to process. Warnings are logged and otherwise
/// discarded; use [`TableNormalizer::normalize`] to inspect them.
pub fn process_credit_card_bill(rows: Option<&[RawTransaction]>) -> Option<TransactionTable> {
    TableNormalizer::new().normalize(rows).map(|r| r.table)
}

/// Coerce an amount field to a decimal.
///
/// A leading `Rs`, `Rs.` or `₹` marker is removed first so its period is not
/// mistaken for a decimal point; then everything except digits, `.` and `-` is
/// stripped. Returns `None` if what is left is not a plain decimal.
pub fn clean_amount(raw: &str) -> Option<Decimal> {
    let without_marker = CURRENCY_PREFIX.replace(raw, "");
    let cleaned = AMOUNT_NOISE.replace_all(&without_marker, "");

    if !PLAIN_DECIMAL.is_match(&cleaned) {
        return None;
    }

    let (sign, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", &*cleaned),
    };
    let digits = digits.strip_suffix('.').unwrap_or(digits);
    let lead = if digits.starts_with('.') { "0" } else { "" };

    Decimal::from_str(&format!("{}{}{}", sign, lead, digits)).ok()
}

fn parse_day_month_long(s: &str) -> Option<NaiveDate> {
    let caps = DATE_DMY_LONG.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_day_month_short(s: &str) -> Option<NaiveDate> {
    let caps = DATE_DMY_SHORT.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let yy: i32 = caps[3].parse().ok()?;
    let year = if yy < TWO_DIGIT_YEAR_PIVOT {
        2000 + yy
    } else {
        1900 + yy
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
    let caps = DATE_ISO.captures(s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
