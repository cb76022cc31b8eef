// REPD CSV export loader

use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;

use repd_recon::properties::coerce_capacity;
use repd_recon::{EntityRecord, ReconError, RegistryLoader};

use crate::error::LoadError;
use crate::sqlite::ID_PREFIX;

pub const COL_REF_ID: &str = "Ref ID";
pub const COL_SITE_NAME: &str = "Site Name";
pub const COL_TECHNOLOGY: &str = "Technology Type";
pub const COL_CAPACITY: &str = "Installed Capacity (MWelec)";
pub const COL_STATUS: &str = "Development Status";
pub const COL_ADDRESS: &str = "Address";
pub const COL_COUNTRY: &str = "Country";
pub const COL_OPERATOR: &str = "Operator (or Applicant)";

/// Registry read straight from a REPD quarterly CSV export.
#[derive(Debug, Clone)]
pub struct CsvRegistry {
    path: PathBuf,
}

impl CsvRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_records(&self) -> Result<Vec<EntityRecord>, LoadError> {
        let content = read_file_as_utf8(&self.path)?;
        parse_records(&content)
    }
}

impl RegistryLoader for CsvRegistry {
    fn load(&self) -> Result<Vec<EntityRecord>, ReconError> {
        Ok(self.load_records()?)
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read file and convert to UTF-8 if needed. REPD exports are often Windows-1252.
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

struct Columns {
    ref_id: usize,
    site_name: usize,
    technology: Option<usize>,
    capacity: Option<usize>,
    status: Option<usize>,
    address: Option<usize>,
    country: Option<usize>,
    operator: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| find(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()));

        Ok(Self {
            ref_id: require(COL_REF_ID)?,
            site_name: require(COL_SITE_NAME)?,
            technology: find(COL_TECHNOLOGY),
            capacity: find(COL_CAPACITY),
            status: find(COL_STATUS),
            address: find(COL_ADDRESS),
            country: find(COL_COUNTRY),
            operator: find(COL_OPERATOR),
        })
    }
}

fn field(row: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Installed capacity in MW. Blank or unparsable values are `None`.
pub fn parse_capacity(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    coerce_capacity(&Value::String(raw.to_string())).ok()
}

pub fn parse_records(content: &str) -> Result<Vec<EntityRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let cols = Columns::locate(reader.headers()?)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let row = result?;
        let (Some(ref_id), Some(name)) = (field(&row, Some(cols.ref_id)), field(&row, Some(cols.site_name))) else {
            skipped += 1;
            continue;
        };

        let record = EntityRecord::new(format!("{ID_PREFIX}{ref_id}"), name)
            .with_capacity(field(&row, cols.capacity).as_deref().and_then(parse_capacity))
            .with_status(field(&row, cols.status))
            .with_technology(field(&row, cols.technology))
            .with_country(field(&row, cols.country))
            .with_site(field(&row, cols.address))
            .with_developer(field(&row, cols.operator));
        records.push(record);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "csv rows without Ref ID or Site Name skipped");
    }
    Ok(records)
}
