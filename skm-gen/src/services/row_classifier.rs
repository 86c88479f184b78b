//! CSV row classifier
//!
//! Turns uploaded CSV bytes into the ordered list of selected skill rows.
//! The first record is a header and is skipped. Column 1 holds the skill text,
//! column 2 a marker; a row is selected when its trimmed, uppercased marker is
//! `X`. The delimiter is detected from the header line.

use csv::ReaderBuilder;
use serde::Serialize;
use skm_common::models::SkillRow;
use thiserror::Error;
use tracing::debug;

/// Delimiters tried during detection, in tie-break order
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

const SELECTED_MARKER: &str = "X";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CsvError {
    #[error("The file is empty or damaged")]
    Empty,

    #[error("Could not read the CSV, check the file format: {0}")]
    Unreadable(String),

    #[error("The CSV must have at least 2 columns (skill text and profile marker)")]
    TooFewColumns,

    #[error("No row is marked with X in the profile column. Nothing to generate")]
    NothingSelected,
}

/// Outcome of classifying one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedRows {
    pub rows: Vec<SkillRow>,
    pub source_file: String,
    /// Data records after the header, selected or not
    pub total_rows: usize,
    pub selected_rows: usize,
}

/// Classify CSV `content` uploaded as `file_name`
///
/// `profile_column` is recorded as the source column of every selected row.
pub fn classify(
    content: &[u8],
    file_name: &str,
    profile_column: &str,
) -> Result<ClassifiedRows, CsvError> {
    let text = std::str::from_utf8(content).map_err(|e| CsvError::Unreadable(e.to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if text.trim().is_empty() {
        return Err(CsvError::Empty);
    }

    let delimiter = detect_delimiter(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| CsvError::Unreadable(e.to_string()))?,
        None => return Err(CsvError::Empty),
    };
    if header.len() < 2 {
        return Err(CsvError::TooFewColumns);
    }

    let mut rows = Vec::new();
    let mut total_rows = 0;

    for (index, record) in records.enumerate() {
        let record = record.map_err(|e| CsvError::Unreadable(e.to_string()))?;
        total_rows += 1;

        if record.len() < 2 {
            continue;
        }

        let skill_text = record.get(0).unwrap_or_default().trim();
        let marker = record.get(1).unwrap_or_default().trim().to_uppercase();

        if skill_text.is_empty() || marker != SELECTED_MARKER {
            continue;
        }

        rows.push(SkillRow {
            id: skill_row_id(skill_text, index),
            text: skill_text.to_string(),
            source_column: profile_column.to_string(),
        });
    }

    debug!(
        file = file_name,
        delimiter = %(delimiter as char).escape_default(),
        total_rows,
        selected_rows = rows.len(),
        "Classified CSV rows"
    );

    if rows.is_empty() {
        return Err(CsvError::NothingSelected);
    }

    Ok(ClassifiedRows {
        selected_rows: rows.len(),
        rows,
        source_file: file_name.to_string(),
        total_rows,
    })
}

/// Deterministic id for the row at data index `index` with `text`
///
/// `skill_<hex>_<index>` where `<hex>` is at most 8 hex digits of the absolute
/// value of a 32-bit rolling hash (`h * 31 + unit`) over UTF-16 code units.
pub fn skill_row_id(text: &str, index: usize) -> String {
    let hash = text
        .encode_utf16()
        .fold(0i32, |acc, unit| {
            (acc << 5).wrapping_sub(acc).wrapping_add(i32::from(unit))
        });

    let hex = format!("{:x}", i64::from(hash).unsigned_abs());
    let hex = &hex[..hex.len().min(8)];
    format!("skill_{}_{}", hex, index)
}

/// Pick the candidate delimiter occurring most often, outside quotes, in
/// the header line; `,` when none occurs
fn detect_delimiter(text: &str) -> u8 {
    let header = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();

    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for byte in header.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(slot) = CANDIDATE_DELIMITERS.iter().position(|d| *d == byte) {
            counts[slot] += 1;
        }
    }

    let mut best = 0;
    for slot in 1..counts.len() {
        if counts[slot] > counts[best] {
            best = slot;
        }
    }

    CANDIDATE_DELIMITERS[best]
}
