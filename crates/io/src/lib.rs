// Registry loaders

pub mod csv;
pub mod error;
pub mod sqlite;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use repd_recon::RegistryLoader;

pub use crate::csv::CsvRegistry;
pub use crate::error::LoadError;
pub use crate::sqlite::SqliteRegistry;

/// On-disk registry format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryFormat {
    #[default]
    Sqlite,
    Csv,
}

impl RegistryFormat {
    /// Guess from the file extension. Anything that isn't `.csv`/`.tsv` is SQLite.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("csv") | Some("tsv") => Self::Csv,
            _ => Self::Sqlite,
        }
    }
}

impl FromStr for RegistryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "db" => Ok(Self::Sqlite),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown registry format '{other}' (expected sqlite or csv)")),
        }
    }
}

impl fmt::Display for RegistryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sqlite => "sqlite",
            Self::Csv => "csv",
        })
    }
}

/// Loader for the registry at `path`.
pub fn open_loader(format: RegistryFormat, path: &Path) -> Arc<dyn RegistryLoader> {
    match format {
        RegistryFormat::Sqlite => Arc::new(SqliteRegistry::new(path)),
        RegistryFormat::Csv => Arc::new(CsvRegistry::new(path)),
    }
}
