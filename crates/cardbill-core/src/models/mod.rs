//! Data models and configuration.

pub mod config;
pub mod transaction;

pub use config::AppConfig;
pub use transaction::{RawTransaction, TableSummary, TransactionRecord, TransactionTable};
