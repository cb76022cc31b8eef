//! Request/response shapes for the W3C Reconciliation Service API (v0.2).
//!
//! Parsing accepts the payload forms OpenRefine and ad-hoc clients send and
//! validates each query before it reaches the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReconError;
use crate::model::{CandidateType, PropertyValue, Query, QueryBatch, MAX_LIMIT};

pub const SINGLE_QUERY_ID: &str = "q0";

#[derive(Debug, Deserialize)]
struct RawQuery {
    query: String,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default, rename = "type")]
    type_filter: Option<String>,
    #[serde(default)]
    type_strict: Option<String>,
    #[serde(default)]
    properties: Option<Vec<PropertyValue>>,
}

impl RawQuery {
    fn validate(self, id: &str, default_limit: usize) -> Result<Query, ReconError> {
        let text = self.query.trim();
        if text.is_empty() {
            return Err(ReconError::invalid(format!("query '{id}': text must not be empty")));
        }

        let limit = match self.limit {
            None => default_limit,
            Some(n) if (1..=MAX_LIMIT as i64).contains(&n) => n as usize,
            Some(n) => {
                return Err(ReconError::invalid(format!(
                    "query '{id}': limit must be between 1 and {MAX_LIMIT}, got {n}"
                )))
            }
        };

        Ok(Query {
            query: text.to_string(),
            limit,
            properties: self.properties.unwrap_or_default(),
            type_filter: self.type_filter,
            type_strict: self.type_strict,
        })
    }
}

/// Batch built from a single free-text query under id `q0`.
pub fn single_query(text: &str, limit: usize) -> Result<QueryBatch, ReconError> {
    let raw = RawQuery {
        query: text.to_string(),
        limit: Some(limit as i64),
        type_filter: None,
        type_strict: None,
        properties: None,
    };
    let query = raw.validate(SINGLE_QUERY_ID, limit)?;
    Ok(QueryBatch::from([(SINGLE_QUERY_ID.to_string(), query)]))
}

/// Parse a batch from JSON text.
///
/// Accepts `{"queries": {...}}`, `{"query": "...", "limit": n}`, or a bare
/// `{"<id>": {...}}` map. `queries` may itself be a JSON-encoded string.
pub fn parse_batch(input: &str, default_limit: usize) -> Result<QueryBatch, ReconError> {
    let value: Value = serde_json::from_str(input).map_err(|e| ReconError::invalid(format!("invalid JSON: {e}")))?;
    parse_batch_value(value, default_limit)
}

pub fn parse_batch_value(value: Value, default_limit: usize) -> Result<QueryBatch, ReconError> {
    let Value::Object(mut map) = value else {
        return Err(ReconError::invalid("queries must be a JSON object"));
    };

    if let Some(queries) = map.remove("queries") {
        return match queries {
            Value::String(encoded) => parse_batch(&encoded, default_limit),
            other => parse_query_map(other, default_limit),
        };
    }

    if map.get("query").is_some_and(Value::is_string) {
        let raw: RawQuery =
            serde_json::from_value(Value::Object(map)).map_err(|e| ReconError::invalid(e.to_string()))?;
        let query = raw.validate(SINGLE_QUERY_ID, default_limit)?;
        return Ok(QueryBatch::from([(SINGLE_QUERY_ID.to_string(), query)]));
    }

    parse_query_map(Value::Object(map), default_limit)
}

fn parse_query_map(value: Value, default_limit: usize) -> Result<QueryBatch, ReconError> {
    let raw: BTreeMap<String, RawQuery> =
        serde_json::from_value(value).map_err(|e| ReconError::invalid(e.to_string()))?;

    if raw.is_empty() {
        return Err(ReconError::invalid("batch contains no queries"));
    }

    raw.into_iter()
        .map(|(id, q)| {
            let query = q.validate(&id, default_limit)?;
            Ok((id, query))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Manifest + health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceManifest {
    pub name: String,
    pub identifier_space: String,
    pub schema_space: String,
    pub default_types: Vec<CandidateType>,
}

impl Default for ServiceManifest {
    fn default() -> Self {
        Self {
            name: "REPD x NESO TEC Reconciliation".into(),
            identifier_space: "https://example.org/renewables/id".into(),
            schema_space: "https://example.org/renewables/schema".into(),
            default_types: vec![CandidateType::generic()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    DbError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub database: String,
    pub project_count: usize,
}

impl HealthReport {
    pub fn connected(project_count: usize) -> Self {
        Self {
            status: HealthStatus::Ok,
            database: "connected".into(),
            project_count,
        }
    }

    pub fn missing() -> Self {
        Self {
            status: HealthStatus::DbError,
            database: "missing".into(),
            project_count: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}
