//! Credit-card bill transaction extraction.
//!
//! Two stages:
//! - line parsing: find date, description and amount in each text line
//! - normalization: validate dates and amounts, drop rows that fail

mod line;
mod normalize;
pub mod patterns;
mod pipeline;

pub use line::{parse_transaction_line, parse_transaction_lines};
pub use normalize::{
    clean_amount, process_credit_card_bill, NormalizeReport, NormalizeWarning, TableNormalizer,
};
pub use pipeline::{StatementExtraction, StatementProcessor, TextSource};
