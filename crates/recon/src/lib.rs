//! `repd-recon`: entity reconciliation engine for renewable-energy projects.
//!
//! Pure engine crate: matches free-text queries against a cached registry snapshot
//! and returns ranked, scored candidates. Storage loaders live in `repd-io`.

pub mod blocking;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalise;
pub mod properties;
pub mod protocol;
pub mod scorer;
pub mod similarity;

pub use cache::{InMemoryLoader, Registry, RegistryCache, RegistryLoader, DEFAULT_SOURCE};
pub use config::MatchConfig;
pub use engine::{rank, Reconciler, MATCH_THRESHOLD};
pub use error::ReconError;
pub use model::{Candidate, CandidateType, EntityRecord, PropertyValue, Query, QueryBatch, QueryResult, ReconcileResponse};
pub use normalise::normalise;
