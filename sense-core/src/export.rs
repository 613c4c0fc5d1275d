//! CSV and JSON export of the transaction list, plus reading an exported
//! CSV back in.
//!
//! Layout of the CSV:
//! Date,Description,Amount,Category,Notes
//!
//! Description and notes are always quoted. Date and category are quoted
//! only when they contain a delimiter, quote or line break. Amounts are
//! written as plain numbers.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::transaction::Transaction;

pub const CSV_HEADERS: [&str; 5] = ["Date", "Description", "Amount", "Category", "Notes"];

const EXPORT_STEM: &str = "bank_analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// `bank_analysis_<YYYY-MM-DD>.<ext>`
pub fn export_filename(format: ExportFormat, date: NaiveDate) -> String {
    format!("{}_{}.{}", EXPORT_STEM, date.format("%Y-%m-%d"), format.extension())
}

pub fn encode_csv(txns: &[Transaction]) -> String {
    let mut lines = Vec::with_capacity(txns.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for t in txns {
        lines.push(
            [
                quote_if_needed(&t.date),
                quote_always(&t.description),
                t.amount.to_string(),
                quote_if_needed(&t.category),
                quote_always(&t.notes),
            ]
            .join(","),
        );
    }

    lines.join("\n")
}

pub fn encode_json(txns: &[Transaction]) -> Result<String> {
    serde_json::to_string_pretty(txns).context("serialize transactions")
}

/// Write `txns` into `dir` using the dated export name.
/// Returns `None` without touching the filesystem when there is nothing to export.
pub fn write_export(
    dir: impl AsRef<Path>,
    format: ExportFormat,
    txns: &[Transaction],
    date: NaiveDate,
) -> Result<Option<PathBuf>> {
    if txns.is_empty() {
        return Ok(None);
    }

    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let body = match format {
        ExportFormat::Csv => encode_csv(txns),
        ExportFormat::Json => encode_json(txns)?,
    };

    let path = dir.join(export_filename(format, date));
    fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), records = txns.len(), "export written");
    Ok(Some(path))
}

/// Parse a CSV produced by [`encode_csv`] (or any CSV with the same header).
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_csv(file).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_csv(reader: impl Read) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?;
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if !headers.iter().map(str::trim).eq(CSV_HEADERS) {
        bail!(
            "unexpected header '{}' (expected '{}')",
            headers.iter().collect::<Vec<_>>().join(","),
            CSV_HEADERS.join(",")
        );
    }

    let mut txns = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // +2: header row, 1-based
        let line = i + 2;

        let amount_str = record.get(2).unwrap_or("").trim();
        let amount: f64 = amount_str
            .parse()
            .with_context(|| format!("line {line}: invalid amount '{amount_str}'"))?;

        txns.push(Transaction {
            date: record.get(0).unwrap_or("").trim().to_string(),
            description: record.get(1).unwrap_or("").to_string(),
            amount,
            category: record.get(3).unwrap_or("").to_string(),
            notes: record.get(4).unwrap_or("").to_string(),
        });
    }

    Ok(txns)
}

fn quote_always(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn quote_if_needed(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        quote_always(field)
    } else {
        field.to_string()
    }
}
