use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EnaError {
    #[error("malformed table: {0}")]
    MalformedTable(String),

    #[error("failed to parse table: {0}")]
    Parse(String),

    #[error("found {found} read-{mate} file(s) for alias {alias}, expected exactly one")]
    FileResolution {
        alias: String,
        mate: u8,
        found: usize,
    },

    #[error("checksum failed for {path}: {message}")]
    Checksum { path: String, message: String },

    #[error("failed to write document: {0}")]
    Serialization(String),

    #[error("invalid study accession: {0}")]
    InvalidStudyAccession(String),

    #[error("invalid sample accession: {0}")]
    InvalidSampleAccession(String),

    #[error("invalid taxon_id: {0}")]
    InvalidTaxonId(String),

    #[error("unknown sequencing platform: {0}")]
    UnknownPlatform(String),

    #[error("invalid hold date (expected YYYY-MM-DD): {0}")]
    InvalidHoldDate(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("no study accession given (use --study or the config file)")]
    MissingStudy,

    #[error("invalid receipt: {0}")]
    Receipt(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
