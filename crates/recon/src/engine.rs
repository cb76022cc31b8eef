use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;

use crate::cache::{Registry, RegistryCache};
use crate::config::MatchConfig;
use crate::error::ReconError;
use crate::model::{Candidate, CandidateType, EntityRecord, Query, QueryBatch, QueryResult, ReconcileResponse};
use crate::normalise::normalise;
use crate::properties::extract;
use crate::scorer::score;

/// Score at or above which a candidate is flagged as a confident match.
pub const MATCH_THRESHOLD: f64 = 90.0;

const DESCRIPTION_SEP: &str = " | ";

/// Ranked candidates for one query against one registry snapshot.
///
/// Blank query text yields an empty list. Candidates scoring ≤ 0 never appear.
pub fn rank(query: &Query, registry: &Registry, min_candidates: usize) -> Vec<Candidate> {
    let text = query.query.trim();
    let query_normalised = normalise(text);
    if query_normalised.is_empty() {
        tracing::debug!("blank query text, no candidates");
        return Vec::new();
    }

    let properties = extract(&query.properties);
    let blocked = registry.candidates(&query_normalised, min_candidates);

    let mut scored: Vec<(&EntityRecord, f64)> = blocked
        .into_iter()
        .map(|record| (record, score(text, &query_normalised, &properties, record)))
        .filter(|(_, s)| round2(*s) > 0.0)
        .collect();

    // Stable: ties keep blocked order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(query.effective_limit());

    tracing::debug!(
        query = text,
        properties = properties.len(),
        returned = scored.len(),
        "ranked query"
    );

    scored.into_iter().map(|(record, s)| build_candidate(record, s)).collect()
}

pub fn build_candidate(record: &EntityRecord, score: f64) -> Candidate {
    let score = round2(score);
    Candidate {
        id: record.id.clone(),
        name: record.name.clone(),
        score,
        is_match: score >= MATCH_THRESHOLD,
        types: vec![candidate_type(record)],
        description: describe(record),
    }
}

pub fn candidate_type(record: &EntityRecord) -> CandidateType {
    match record.technology.as_deref() {
        Some(tech) => CandidateType::technology(tech),
        None => CandidateType::generic(),
    }
}

/// `technology | <capacity> MW | status | Developer: .. | Site: ..`, skipping absent parts.
pub fn describe(record: &EntityRecord) -> Option<String> {
    let parts: Vec<String> = [
        record.technology.clone(),
        record.capacity_mw.map(|mw| format!("{mw} MW")),
        record.status.clone(),
        record.developer().map(|d| format!("Developer: {d}")),
        record.site_name().map(|s| format!("Site: {s}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(DESCRIPTION_SEP))
    }
}

fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// Reconciliation entry point. Owns nothing but a handle on the shared cache.
#[derive(Debug, Clone)]
pub struct Reconciler {
    cache: Arc<RegistryCache>,
    config: MatchConfig,
}

impl Reconciler {
    pub fn new(cache: Arc<RegistryCache>, config: MatchConfig) -> Self {
        Self { cache, config }
    }

    /// Current snapshot for the configured source.
    pub fn registry(&self) -> Result<Arc<Registry>, ReconError> {
        self.cache.records(&self.config.source)
    }

    pub fn reconcile_query(&self, query: &Query) -> Result<Vec<Candidate>, ReconError> {
        let registry = self.registry()?;
        Ok(rank(query, &registry, self.config.min_candidates))
    }

    /// Run every query in `batch` against a single snapshot.
    ///
    /// Only an unavailable registry fails the call. A query that fails on its own
    /// comes back as an empty result under its key.
    pub fn reconcile_batch(&self, batch: &QueryBatch) -> Result<ReconcileResponse, ReconError> {
        let registry = self.registry()?;
        let min_candidates = self.config.min_candidates;

        let run_one = |(id, query): (&String, &Query)| {
            let result = match isolate(id, || rank(query, &registry, min_candidates)) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(error = %e, "query failed, returning empty result");
                    Vec::new()
                }
            };
            (id.clone(), QueryResult { result })
        };

        let response: ReconcileResponse = if self.config.parallel {
            batch.par_iter().map(run_one).collect()
        } else {
            batch.iter().map(run_one).collect()
        };

        let total: usize = response.values().map(|r| r.result.len()).sum();
        tracing::info!(
            source = registry.source(),
            queries = batch.len(),
            candidates = total,
            "reconciliation complete"
        );

        Ok(response)
    }

    /// Drop cached snapshots; the next call reloads from the backing store.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

/// Run one query's work, turning a panic into a per-query error.
fn isolate<T>(query_id: &str, f: impl FnOnce() -> T) -> Result<T, ReconError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".into());
        ReconError::QueryFailed {
            query_id: query_id.to_string(),
            message,
        }
    })
}
