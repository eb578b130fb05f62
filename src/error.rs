//! Error types for workbook loading and the analysis run.

use thiserror::Error;

/// Failure to read one source file. Always recoverable: the file is skipped
/// and the run continues with the others.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet could not be parsed: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV sheet could not be parsed: {0}")]
    Csv(#[from] csv::Error),

    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request failed with status: {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("unsupported source: {0}")]
    Unsupported(String),
}

/// Conditions that end a run because nothing downstream can proceed.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no lecture rows were extracted: no sheet matched the committee (kurul) filter or every matching sheet was empty")]
    NoSheetsMatched,

    #[error("no valid instructor rows: {extracted} rows were extracted but none has a usable instructor name")]
    NoValidInstructorRows { extracted: usize },
}
