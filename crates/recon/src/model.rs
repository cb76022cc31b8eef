use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalise::normalise;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// One canonical project in the registry.
///
/// Normalised fields are private and only ever derived from their source field,
/// so they cannot drift from what `normalise` would produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    name_normalised: String,
    pub capacity_mw: Option<f64>,
    pub status: Option<String>,
    pub technology: Option<String>,
    pub country: Option<String>,
    site_name: Option<String>,
    site_name_normalised: Option<String>,
    developer: Option<String>,
    developer_normalised: Option<String>,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            name_normalised: normalise(&name),
            name,
            capacity_mw: None,
            status: None,
            technology: None,
            country: None,
            site_name: None,
            site_name_normalised: None,
            developer: None,
            developer_normalised: None,
        }
    }

    pub fn with_capacity(mut self, capacity_mw: Option<f64>) -> Self {
        self.capacity_mw = capacity_mw.filter(|c| c.is_finite());
        self
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = non_blank(status);
        self
    }

    pub fn with_technology(mut self, technology: Option<String>) -> Self {
        self.technology = non_blank(technology);
        self
    }

    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = non_blank(country);
        self
    }

    pub fn with_site(mut self, site_name: Option<String>) -> Self {
        self.site_name = non_blank(site_name);
        self.site_name_normalised = self.site_name.as_deref().map(normalise);
        self
    }

    pub fn with_developer(mut self, developer: Option<String>) -> Self {
        self.developer = non_blank(developer);
        self.developer_normalised = self.developer.as_deref().map(normalise);
        self
    }

    pub fn name_normalised(&self) -> &str {
        &self.name_normalised
    }

    pub fn site_name(&self) -> Option<&str> {
        self.site_name.as_deref()
    }

    pub fn site_name_normalised(&self) -> Option<&str> {
        self.site_name_normalised.as_deref()
    }

    pub fn developer(&self) -> Option<&str> {
        self.developer.as_deref()
    }

    pub fn developer_normalised(&self) -> Option<&str> {
        self.developer_normalised.as_deref()
    }

    /// Normalised name, site and developer, in that order, skipping absent fields.
    pub fn comparable_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name_normalised.as_str())
            .chain(self.site_name_normalised.as_deref())
            .chain(self.developer_normalised.as_deref())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

pub const DEFAULT_LIMIT: usize = 3;
pub const MAX_LIMIT: usize = 100;

/// One `(pid, v)` side-property constraint. Either half may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyValue {
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(default)]
    pub v: Option<serde_json::Value>,
}

impl PropertyValue {
    pub fn new(pid: impl Into<String>, v: impl Into<serde_json::Value>) -> Self {
        Self {
            pid: Some(pid.into()),
            v: Some(v.into()),
        }
    }
}

/// A single reconciliation query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyValue>,
    /// Type filter. Carried through, never evaluated by scoring.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_strict: Option<String>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<PropertyValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<PropertyValue>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            query: text.into(),
            limit: DEFAULT_LIMIT,
            properties: Vec::new(),
            type_filter: None,
            type_strict: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_property(mut self, pid: impl Into<String>, v: impl Into<serde_json::Value>) -> Self {
        self.properties.push(PropertyValue::new(pid, v));
        self
    }

    /// Limit clamped into `1..=MAX_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_LIMIT)
    }
}

/// Batch of queries keyed by caller-supplied ids. Sorted by id; submission
/// order is not kept since JSON object keys are unordered.
pub type QueryBatch = BTreeMap<String, Query>;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateType {
    pub id: String,
    pub name: String,
}

impl CandidateType {
    pub const GENERIC_ID: &'static str = "/renewable";
    pub const GENERIC_NAME: &'static str = "Renewable Facility";

    pub fn generic() -> Self {
        Self {
            id: Self::GENERIC_ID.into(),
            name: Self::GENERIC_NAME.into(),
        }
    }

    /// `/technology/<slug>` named after the technology itself.
    pub fn technology(technology: &str) -> Self {
        Self {
            id: format!("/technology/{}", technology.to_lowercase().replace(' ', "_")),
            name: technology.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub score: f64,
    #[serde(rename = "match")]
    pub is_match: bool,
    #[serde(rename = "type")]
    pub types: Vec<CandidateType>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub result: Vec<Candidate>,
}

/// Batch response keyed by the same ids as the request, serialized in sorted
/// key order.
pub type ReconcileResponse = BTreeMap<String, QueryResult>;
