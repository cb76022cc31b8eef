//! Candidate-set reduction ahead of scoring.
//!
//! Every record is keyed by cheap token fragments (whole words plus 4-char
//! prefixes). A query only reaches the scorer against records sharing a fragment,
//! with two widening fallbacks so small or oddly tokenised registries still
//! produce enough candidates.

use std::collections::HashSet;

use crate::model::EntityRecord;

pub const DEFAULT_MIN_CANDIDATES: usize = 10;

const PREFIX_LEN: usize = 4;
const FALLBACK_PREFIX_LEN: usize = 3;

/// Block keys for an already normalised string.
pub fn blocks_for(normalised: &str) -> HashSet<String> {
    let mut blocks = HashSet::new();

    for word in normalised.split_whitespace() {
        if let Some(prefix) = char_prefix(word, PREFIX_LEN) {
            blocks.insert(prefix.to_string());
        }
        blocks.insert(word.to_string());
    }

    if let Some(prefix) = char_prefix(normalised, PREFIX_LEN) {
        blocks.insert(prefix.to_string());
    }

    blocks
}

/// Union of block keys over a record's normalised name, site and developer.
pub fn record_blocks(record: &EntityRecord) -> HashSet<String> {
    record.comparable_fields().flat_map(blocks_for).collect()
}

/// First `n` chars of `s`, or `None` if `s` is shorter.
fn char_prefix(s: &str, n: usize) -> Option<&str> {
    match s.char_indices().nth(n) {
        Some((end, _)) => Some(&s[..end]),
        None if s.chars().count() == n => Some(s),
        None => None,
    }
}

/// Precomputed block keys for one registry snapshot, in registry order.
#[derive(Debug, Default)]
pub struct BlockingIndex {
    blocks: Vec<HashSet<String>>,
}

impl BlockingIndex {
    pub fn build(records: &[EntityRecord]) -> Self {
        Self {
            blocks: records.iter().map(record_blocks).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Records worth scoring for `query_normalised`.
    ///
    /// `records` must be the slice this index was built from. Order is preserved.
    pub fn candidates<'a>(
        &self,
        query_normalised: &str,
        records: &'a [EntityRecord],
        min_candidates: usize,
    ) -> Vec<&'a EntityRecord> {
        debug_assert_eq!(self.blocks.len(), records.len());

        let query_blocks = blocks_for(query_normalised);
        if query_blocks.is_empty() {
            return records.iter().collect();
        }

        let blocked: Vec<&EntityRecord> = records
            .iter()
            .zip(&self.blocks)
            .filter(|(_, blocks)| !blocks.is_disjoint(&query_blocks))
            .map(|(record, _)| record)
            .collect();

        if blocked.len() >= min_candidates {
            return blocked;
        }

        let needle = char_prefix(query_normalised, FALLBACK_PREFIX_LEN).unwrap_or(query_normalised);
        let substring: Vec<&EntityRecord> = records
            .iter()
            .filter(|r| r.comparable_fields().any(|field| field.contains(needle)))
            .collect();

        if substring.len() >= min_candidates {
            tracing::trace!(blocked = blocked.len(), substring = substring.len(), "substring fallback");
            return substring;
        }

        tracing::trace!(blocked = blocked.len(), substring = substring.len(), "full scan fallback");
        records.iter().collect()
    }
}

/// One-shot blocking without a prebuilt index.
pub fn get_candidates<'a>(
    query_normalised: &str,
    records: &'a [EntityRecord],
    min_candidates: usize,
) -> Vec<&'a EntityRecord> {
    BlockingIndex::build(records).candidates(query_normalised, records, min_candidates)
}
