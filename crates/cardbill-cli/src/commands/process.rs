//! Process command - extract transactions from a single bill.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use cardbill_core::{
    format_amount, AppConfig, CardbillError, ExportFormat, StatementExtraction, StatementProcessor,
    TableExporter, TableSummary, TextSource, TransactionTable,
};

/// Image extensions sent straight to OCR.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tiff", "bmp"];

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, text or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from the output extension, then config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only PDF text extraction
    #[arg(long)]
    text_only: bool,

    /// Print transaction count and total amount
    #[arg(long)]
    summary: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV output
    Csv,
    /// Excel workbook
    Xlsx,
    /// JSON output
    Json,
    /// Preview table with summary
    Text,
}

impl OutputFormat {
    /// Pick the format: explicit choice, then the output file extension, then the config.
    pub fn resolve(format: Option<Self>, output: Option<&Path>, config: &AppConfig) -> Self {
        let inferred = output
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .and_then(ExportFormat::from_extension);

        format.unwrap_or(match inferred.unwrap_or(config.export.default_format) {
            ExportFormat::Csv => OutputFormat::Csv,
            ExportFormat::Xlsx => OutputFormat::Xlsx,
            ExportFormat::Json => OutputFormat::Json,
        })
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;
    let format = OutputFormat::resolve(args.format, args.output.as_deref(), &config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_supported(&args.input) {
        anyhow::bail!("Unsupported file format: {}", extension(&args.input));
    }
    if format == OutputFormat::Xlsx && args.output.is_none() {
        anyhow::bail!("XLSX output is binary; use --output to write it to a file");
    }

    check_file_size(&args.input, &config)?;
    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Loading OCR models...");
    let text_only = args.text_only || extension(&args.input) == "txt";
    let processor = build_processor(&config, args.model_dir.as_deref(), text_only);

    pb.set_message("Extracting transactions...");
    let result = extract_file(&args.input, &processor);
    pb.finish_and_clear();

    let extraction = match result {
        Ok(extraction) => extraction,
        Err(e) if is_no_data(&e) => {
            println!(
                "{} No transactions found in {}",
                style("ℹ").blue(),
                args.input.display()
            );
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    for warning in &extraction.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    let content = render(&extraction.table, format, &config)?;
    let summary = extraction.table.summary();
    let currency = &config.extraction.currency_symbol;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &content)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
        if args.summary && format != OutputFormat::Text {
            println!("{}", format_summary(&summary, currency));
        }
    } else {
        std::io::stdout().write_all(&content)?;
        // Keep piped CSV/JSON clean.
        if args.summary && format != OutputFormat::Text {
            eprintln!("{}", format_summary(&summary, currency));
        }
    }

    debug!(
        "Extracted {} transactions from {:?} in {:?}",
        summary.transactions,
        extraction.source,
        start.elapsed()
    );

    Ok(())
}

/// Whether `path` has an extension the extractor reads.
pub fn is_supported(path: &Path) -> bool {
    let ext = extension(path);
    ext == "pdf" || ext == "txt" || IMAGE_EXTENSIONS.contains(&ext.as_str())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Create a processor, attaching the OCR engine when its models are available.
pub fn build_processor(
    config: &AppConfig,
    model_dir: Option<&Path>,
    text_only: bool,
) -> StatementProcessor {
    let processor = StatementProcessor::from_config(config);
    if text_only {
        return processor;
    }

    let model_dir = model_dir.unwrap_or(config.ocr.model_dir.as_path());
    if !config.ocr.models_present(model_dir) {
        warn!(
            "OCR models not found at {}, scanned bills cannot be read",
            model_dir.display()
        );
        return processor;
    }

    match cardbill_core::PureOcrEngine::from_dir(model_dir, &config.ocr) {
        Ok(engine) => processor.with_recognizer(Box::new(engine)),
        Err(e) => {
            warn!("Failed to load OCR engine: {}", e);
            processor
        }
    }
}

/// Extract transactions from a file, dispatching on its extension.
pub fn extract_file(
    path: &Path,
    processor: &StatementProcessor,
) -> anyhow::Result<StatementExtraction> {
    let ext = extension(path);
    let extraction = match ext.as_str() {
        "pdf" => processor.process_pdf(&fs::read(path)?)?,
        "txt" => processor.process_text(&fs::read_to_string(path)?, TextSource::PlainText)?,
        e if IMAGE_EXTENSIONS.contains(&e) => {
            let image = image::open(path)?;
            processor.process_image(&image)?
        }
        _ => anyhow::bail!("Unsupported file format: {}", ext),
    };
    Ok(extraction)
}

/// Whether `error` only means the document held no transactions.
pub fn is_no_data(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<CardbillError>()
        .is_some_and(CardbillError::is_no_data)
}

/// Warn about oversized input. The limit is informational only.
fn check_file_size(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
    let size = fs::metadata(path)?.len();
    let limit = config.pdf.max_file_size_mb * 1024 * 1024;
    if size > limit {
        eprintln!(
            "{} {} is {:.1} MB, above the {} MB limit; processing anyway",
            style("⚠").yellow(),
            path.display(),
            size as f64 / (1024.0 * 1024.0),
            config.pdf.max_file_size_mb
        );
    }
    Ok(())
}

/// Serialize `table` in `format`.
pub fn render(
    table: &TransactionTable,
    format: OutputFormat,
    config: &AppConfig,
) -> anyhow::Result<Vec<u8>> {
    let exporter = TableExporter::from_config(&config.export);
    let bytes = match format {
        OutputFormat::Csv => exporter.to_bytes(table, ExportFormat::Csv)?,
        OutputFormat::Xlsx => exporter.to_bytes(table, ExportFormat::Xlsx)?,
        OutputFormat::Json => exporter.to_bytes(table, ExportFormat::Json)?,
        OutputFormat::Text => {
            let mut text = format_preview(table, config.extraction.preview_rows);
            text.push('\n');
            text.push_str(&format_summary(
                &table.summary(),
                &config.extraction.currency_symbol,
            ));
            text.push('\n');
            text.into_bytes()
        }
    };
    Ok(bytes)
}

/// First `rows` transactions as an aligned table.
fn format_preview(table: &TransactionTable, rows: usize) -> String {
    let head = table.head(rows);
    let width = head
        .iter()
        .map(|r| r.description.chars().count())
        .max()
        .unwrap_or(0)
        .max("Description".len());

    let mut output = format!("{:<10}  {:<width$}  {:>14}\n", "Date", "Description", "Amount");
    for record in head {
        output.push_str(&format!(
            "{:<10}  {:<width$}  {:>14}\n",
            record.date_string(),
            record.description,
            format_amount(record.amount)
        ));
    }
    if table.len() > head.len() {
        output.push_str(&format!("... {} more\n", table.len() - head.len()));
    }
    output
}

fn format_summary(summary: &TableSummary, currency: &str) -> String {
    let total = match summary.total_amount {
        Some(total) => format!("{}{}", currency, format_amount(total)),
        None => "out of range".to_string(),
    };
    format!(
        "Total number of transactions: {}\nTotal amount: {}",
        summary.transactions, total
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TransactionTable {
        let processor = StatementProcessor::new();
        processor
            .process_text(
                "15/03/23 Grocery Store Rs. 1,000.50\n16/03/23 Fuel 350.00\n17/03/23 Cafe 0.00",
                TextSource::PlainText,
            )
            .map(|e| e.table)
            .unwrap()
    }

    #[test]
    fn test_format_summary() {
        let summary = table().summary();
        assert_eq!(
            format_summary(&summary, "₹"),
            "Total number of transactions: 3\nTotal amount: ₹1,350.50"
        );
    }

    #[test]
    fn test_format_preview_truncates() {
        let preview = format_preview(&table(), 2);
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Date"));
        assert!(lines[1].contains("Grocery Store"));
        assert!(lines[1].ends_with("1,000.50"));
        assert_eq!(lines[3], "... 1 more");
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("bill.PDF")));
        assert!(is_supported(Path::new("bill.txt")));
        assert!(is_supported(Path::new("scan.jpeg")));
        assert!(!is_supported(Path::new("bill.docx")));
        assert!(!is_supported(Path::new("bill")));
    }

    #[test]
    fn test_format_summary_out_of_range() {
        let summary = TableSummary {
            transactions: 2,
            total_amount: None,
        };
        assert_eq!(
            format_summary(&summary, "₹"),
            "Total number of transactions: 2\nTotal amount: out of range"
        );
    }

    #[test]
    fn test_resolve_format() {
        let mut config = AppConfig::default();
        assert_eq!(OutputFormat::resolve(None, None, &config), OutputFormat::Csv);
        config.export.default_format = ExportFormat::Json;
        assert_eq!(OutputFormat::resolve(None, None, &config), OutputFormat::Json);
        assert_eq!(
            OutputFormat::resolve(Some(OutputFormat::Text), None, &config),
            OutputFormat::Text
        );
    }

    #[test]
    fn test_resolve_format_from_output_extension() {
        let config = AppConfig::default();
        let xlsx = Path::new("out/bill.XLSX");
        assert_eq!(
            OutputFormat::resolve(None, Some(xlsx), &config),
            OutputFormat::Xlsx
        );
        assert_eq!(
            OutputFormat::resolve(Some(OutputFormat::Json), Some(xlsx), &config),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::resolve(None, Some(Path::new("bill.out")), &config),
            OutputFormat::Csv
        );
    }

    #[test]
    fn test_no_data_detection() {
        let err: anyhow::Error = StatementProcessor::new()
            .process_text("nothing here", TextSource::PlainText)
            .unwrap_err()
            .into();
        assert!(is_no_data(&err));
        assert!(!is_no_data(&anyhow::anyhow!("other")));
    }
}
