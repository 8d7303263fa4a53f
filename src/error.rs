use crate::columns::ColumnRole;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Could not resolve a column for the {0} role from the sheet headers")]
    MissingColumnRole(ColumnRole),

    #[error("No rows available to process")]
    NoData,

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
