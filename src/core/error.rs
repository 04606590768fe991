use thiserror::Error;

/// Errors raised while building, loading or screening against a reference database.
///
/// Configuration and database errors are fatal to a run. A `MappingFile`
/// error is reported by the TaxID loader but callers are expected to degrade
/// to an empty mapping rather than abort.
#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database read error: {0}")]
    DatabaseRead(String),

    #[error("Input read error: {0}")]
    InputRead(String),

    #[error("Mapping file error: {0}")]
    MappingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to (de)serialize database: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, ScreenError>;
