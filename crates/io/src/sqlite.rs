// SQLite registry store

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, Row};

use repd_recon::{EntityRecord, ReconError, RegistryLoader};

use crate::error::LoadError;

/// Prefix applied to numeric project ids.
pub const ID_PREFIX: &str = "repd-";

/// Tables the loader reads. Extra columns and tables are ignored.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS technology (
    technology_id INTEGER PRIMARY KEY,
    tech_name     TEXT
);

CREATE TABLE IF NOT EXISTS site (
    site_id         INTEGER PRIMARY KEY,
    site_name       TEXT NOT NULL,
    name_normalised TEXT NOT NULL,
    postcode        TEXT,
    country         TEXT
);

CREATE TABLE IF NOT EXISTS company (
    company_id      INTEGER PRIMARY KEY,
    legal_name      TEXT NOT NULL,
    name_normalised TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS project (
    project_id      INTEGER PRIMARY KEY,
    canonical_name  TEXT NOT NULL,
    name_normalised TEXT NOT NULL,
    status          TEXT,
    capacity_mw     REAL,
    technology_id   INTEGER REFERENCES technology(technology_id),
    site_id         INTEGER REFERENCES site(site_id),
    lead_company    INTEGER REFERENCES company(company_id),
    country         TEXT
);
";

const LOAD_SQL: &str = "
SELECT p.project_id, p.canonical_name, p.capacity_mw, p.status, p.country,
       t.tech_name, s.site_name, c.legal_name
FROM project p
LEFT JOIN technology t ON t.technology_id = p.technology_id
LEFT JOIN site s       ON s.site_id       = p.site_id
LEFT JOIN company c    ON c.company_id    = p.lead_company
ORDER BY p.project_id
";

/// Registry stored in the normalised REPD SQLite layout.
#[derive(Debug, Clone)]
pub struct SqliteRegistry {
    path: PathBuf,
}

impl SqliteRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Read-only so a wrong path never creates an empty database.
    fn open(&self) -> Result<Connection, LoadError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Ok(Connection::open_with_flags(&self.path, flags)?)
    }

    pub fn load_records(&self) -> Result<Vec<EntityRecord>, LoadError> {
        let conn = self.open()?;
        read_records(&conn)
    }

    pub fn project_count(&self) -> Result<usize, LoadError> {
        let conn = self.open()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM project", [], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }
}

/// Every project row joined with its technology, site and lead company.
pub fn read_records(conn: &Connection) -> Result<Vec<EntityRecord>, LoadError> {
    let mut stmt = conn.prepare(LOAD_SQL)?;
    let rows = stmt.query_map([], record_from_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }

    tracing::debug!(records = records.len(), "read sqlite registry");
    Ok(records)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<EntityRecord> {
    let project_id: i64 = row.get(0)?;
    let name: String = row.get(1)?;

    Ok(EntityRecord::new(format!("{ID_PREFIX}{project_id}"), name)
        .with_capacity(row.get(2)?)
        .with_status(row.get(3)?)
        .with_country(row.get(4)?)
        .with_technology(row.get(5)?)
        .with_site(row.get(6)?)
        .with_developer(row.get(7)?))
}

impl RegistryLoader for SqliteRegistry {
    fn load(&self) -> Result<Vec<EntityRecord>, ReconError> {
        Ok(self.load_records()?)
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn count(&self) -> Result<usize, ReconError> {
        Ok(self.project_count()?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
