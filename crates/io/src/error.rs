use thiserror::Error;

use repd_recon::ReconError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing column '{0}'")]
    MissingColumn(String),
}

impl From<LoadError> for ReconError {
    fn from(e: LoadError) -> Self {
        ReconError::unavailable(e.to_string())
    }
}
