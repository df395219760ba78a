//! Serializers for a finished transaction table.
//!
//! Every format carries exactly the columns `Date`, `Description`, `Amount`.

use std::io::Write;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::models::config::ExportConfig;
use crate::models::transaction::TransactionTable;

/// Output column names, in order.
pub const COLUMNS: [&str; 3] = ["Date", "Description", "Amount"];

/// Downloadable file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Delimited text.
    #[default]
    Csv,
    /// Excel workbook.
    Xlsx,
    /// JSON array of records.
    Json,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Writes transaction tables in the supported formats.
#[derive(Debug, Clone)]
pub struct TableExporter {
    sheet_name: String,
    delimiter: u8,
}

impl TableExporter {
    pub fn new() -> Self {
        Self::from_config(&ExportConfig::default())
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        let delimiter = if config.csv_delimiter.is_ascii() {
            config.csv_delimiter as u8
        } else {
            b','
        };
        Self {
            sheet_name: config.sheet_name.clone(),
            delimiter,
        }
    }

    /// Set the worksheet name used for XLSX output.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Set the CSV field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Serialize `table` to bytes in `format`.
    pub fn to_bytes(
        &self,
        table: &TransactionTable,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut buf = Vec::new();
                self.write_csv(table, &mut buf)?;
                Ok(buf)
            }
            ExportFormat::Xlsx => self.to_xlsx(table),
            ExportFormat::Json => Ok(serde_json::to_vec_pretty(table)?),
        }
    }

    /// Write `table` as delimited text with a header row.
    pub fn write_csv<W: Write>(
        &self,
        table: &TransactionTable,
        writer: W,
    ) -> Result<(), ExportError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        wtr.write_record(COLUMNS)?;
        for record in table {
            wtr.write_record([
                record.date_string(),
                record.description.clone(),
                record.amount.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Build an XLSX workbook with one sheet: header row, text dates, numeric amounts.
    pub fn to_xlsx(&self, table: &TransactionTable) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let money = Format::new().set_num_format("#,##0.00");

        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name)?;

        for (col, name) in COLUMNS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *name, &header)?;
        }

        for (i, record) in table.iter().enumerate() {
            let row = (i + 1) as u32;
            sheet.write_string(row, 0, record.date_string())?;
            sheet.write_string(row, 1, record.description.as_str())?;
            sheet.write_number_with_format(
                row,
                2,
                record.amount.to_f64().unwrap_or_default(),
                &money,
            )?;
        }

        sheet.set_column_width(0, 12)?;
        sheet.set_column_width(1, 40)?;
        sheet.set_column_width(2, 14)?;

        Ok(workbook.save_to_buffer()?)
    }
}

impl Default for TableExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format an amount with thousands separators and two decimals (`1,234.56`).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.as_str()),
    };
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s, "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, decimal_part)
}
