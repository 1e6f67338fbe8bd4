use thiserror::Error;

#[derive(Error, Debug)]
pub enum FuelError {
    #[error("Could not read {path}: {reason}")]
    Ingest { path: String, reason: String },

    #[error("Malformed data: {0}")]
    DataFormat(String),

    #[error("Cannot compute {0}: division by zero")]
    DivisionByZero(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl FuelError {
    pub fn ingest(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Ingest {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FuelError>;
