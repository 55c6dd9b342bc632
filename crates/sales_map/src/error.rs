use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SalesMapError>;

#[derive(Debug, Error)]
pub enum SalesMapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV Header: {0}")]
    CsvHeader(String),

    #[error("Invalid number at row {row}, column '{column}': {value}")]
    NumberParse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Duplicate entry for region '{region}' and product '{product}'")]
    DuplicateEntry { region: String, product: String },

    #[error("Unknown topology object: {0}")]
    UnknownObject(String),

    #[error("Arc index {index} out of range (topology has {len} arcs)")]
    ArcIndex { index: i64, len: usize },

    #[error("Geometry in object '{object}' has no '{property}' property")]
    MissingProperty { object: String, property: String },

    #[error("Failed to read file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No sales records found")]
    EmptyData,
}

impl From<toml::de::Error> for SalesMapError {
    fn from(err: toml::de::Error) -> Self {
        SalesMapError::Config(format!("TOML parse error: {}", err))
    }
}
