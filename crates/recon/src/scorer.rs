//! Multi-signal confidence score for one query/record pair.
//!
//! Calibration constants below are fixed. Change them only against a labelled
//! ground-truth set.

use crate::model::EntityRecord;
use crate::properties::{QueryProperties, CUSTOMER_NAME, PLANT_TYPE};
use crate::similarity::token_set_ratio_normalised;
use crate::normalise::normalise;

pub const NAME_WEIGHT: f64 = 0.50;
pub const SITE_WEIGHT: f64 = 0.20;
pub const DEVELOPER_WEIGHT: f64 = 0.15;
pub const TECHNOLOGY_WEIGHT: f64 = 0.05;

/// `(band, bonus)` pairs, tightest first; the first band that holds wins.
pub const CAPACITY_BONUSES: [(f64, f64); 3] = [(0.05, 10.0), (0.15, 5.0), (0.25, 2.0)];

pub const DEFAULT_CAPACITY_BAND: f64 = 0.10;
pub const MAX_SCORE: f64 = 100.0;

/// Per-component breakdown. `None` means the component was not evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub name: f64,
    pub site: Option<f64>,
    pub developer: Option<f64>,
    pub technology: Option<f64>,
    pub capacity_bonus: f64,
}

impl ScoreBreakdown {
    /// Weighted mean over evaluated components, plus the capacity bonus, capped at 100.
    pub fn total(&self) -> f64 {
        let mut weighted = NAME_WEIGHT * self.name;
        let mut weight = NAME_WEIGHT;

        for (score, w) in [
            (self.site, SITE_WEIGHT),
            (self.developer, DEVELOPER_WEIGHT),
            (self.technology, TECHNOLOGY_WEIGHT),
        ] {
            if let Some(score) = score {
                weighted += w * score;
                weight += w;
            }
        }

        (weighted / weight + self.capacity_bonus).min(MAX_SCORE)
    }
}

/// True when `record` lies within `band` (fraction of `query`) of `query`.
/// A missing side never excludes.
pub fn capacity_within_band(query: Option<f64>, record: Option<f64>, band: f64) -> bool {
    match (query, record) {
        (Some(q), Some(r)) => (r - q).abs() <= band * q,
        _ => true,
    }
}

/// Additive bonus for a record capacity close to the declared one.
pub fn capacity_bonus(query: Option<f64>, record: Option<f64>) -> f64 {
    let (Some(q), Some(r)) = (query, record) else {
        return 0.0;
    };

    CAPACITY_BONUSES
        .iter()
        .find(|(band, _)| capacity_within_band(Some(q), Some(r), *band))
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0)
}

pub fn breakdown(
    query_text: &str,
    query_normalised: &str,
    properties: &QueryProperties,
    record: &EntityRecord,
) -> ScoreBreakdown {
    let name = token_set_ratio_normalised(query_normalised, record.name_normalised());

    let site = record
        .site_name_normalised()
        .map(|site| token_set_ratio_normalised(query_normalised, site));

    let developer = record.developer_normalised().map(|dev| {
        let developer_query = properties
            .text(CUSTOMER_NAME)
            .map(|c| normalise(&c))
            .unwrap_or_else(|| normalise(query_text));
        token_set_ratio_normalised(&developer_query, dev)
    });

    let technology = match (properties.text(PLANT_TYPE), record.technology.as_deref()) {
        (Some(plant), Some(tech)) => Some(token_set_ratio_normalised(&normalise(&plant), &normalise(tech))),
        _ => None,
    };

    ScoreBreakdown {
        name,
        site,
        developer,
        technology,
        capacity_bonus: capacity_bonus(properties.capacity_mw(), record.capacity_mw),
    }
}

/// Confidence in `[0, 100]` that `record` is what the query refers to.
pub fn score(
    query_text: &str,
    query_normalised: &str,
    properties: &QueryProperties,
    record: &EntityRecord,
) -> f64 {
    breakdown(query_text, query_normalised, properties, record).total()
}
