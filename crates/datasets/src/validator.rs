use thiserror::Error;

use crate::{ValidatedUpload, CSV_EXTENSION, MAX_UPLOAD_BYTES};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Only .csv files are accepted")]
    InvalidExtension,

    #[error("File exceeds the {limit} byte limit ({size} bytes received)")]
    TooLarge { size: usize, limit: usize },

    #[error("File must be UTF-8 encoded text")]
    EncodingError,

    #[error("File is empty")]
    EmptyFile,

    #[error("CSV header row is missing or blank")]
    InvalidHeader,
}

/// Checks run in a fixed order; the first failure wins.
///
/// - extension must be `.csv` (case-sensitive)
/// - at most [`MAX_UPLOAD_BYTES`]
/// - UTF-8 text
/// - not blank
/// - first line parses as a CSV record with at least one non-blank field
pub fn validate<'a>(filename: &str, content: &'a [u8]) -> Result<ValidatedUpload<'a>, ValidationError> {
    if !filename.ends_with(CSV_EXTENSION) {
        return Err(ValidationError::InvalidExtension);
    }
    if content.len() > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size: content.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let text = std::str::from_utf8(content).map_err(|_| ValidationError::EncodingError)?;
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyFile);
    }

    // Excel likes to prepend a BOM
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let header = text.lines().next().unwrap_or_default();
    if !header_has_fields(header) {
        return Err(ValidationError::InvalidHeader);
    }

    Ok(ValidatedUpload {
        filename: filename.to_string(),
        size: content.len() as u64,
        bytes: content,
    })
}

fn header_has_fields(line: &str) -> bool {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().any(|field| !field.trim().is_empty()),
        _ => false,
    }
}
