//! `repd reconcile` and `repd validate`.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use repd_config::Settings;
use repd_io::open_loader;
use repd_recon::protocol::{parse_batch, single_query};
use repd_recon::{PropertyValue, QueryBatch, Reconciler, RegistryCache};

use crate::CliError;

/// Composition root: one cache holding the configured registry, one engine over it.
pub fn build_reconciler(settings: &Settings) -> Reconciler {
    let registry = &settings.registry;
    let loader = open_loader(registry.effective_format(), &registry.effective_path());
    let cache = RegistryCache::new().with_source(registry.source_key.clone(), loader);
    Reconciler::new(Arc::new(cache), settings.match_config())
}

pub fn cmd_reconcile(
    settings: &Settings,
    query: Option<String>,
    queries: Option<PathBuf>,
    limit: Option<usize>,
    properties: Vec<String>,
    compact: bool,
) -> Result<(), CliError> {
    let default_limit = settings.matching.default_limit;

    let batch = match (query, queries) {
        (Some(text), _) => {
            let mut batch = single_query(&text, limit.unwrap_or(default_limit)).map_err(CliError::recon)?;
            let props = properties.iter().map(|p| parse_property(p)).collect::<Result<Vec<_>, _>>()?;
            for query in batch.values_mut() {
                query.properties = props.clone();
            }
            batch
        }
        (None, Some(path)) => {
            let input = read_input(&path)?;
            parse_batch(&input, default_limit).map_err(CliError::recon)?
        }
        (None, None) => return Err(CliError::args("either --query or --queries is required")),
    };

    let response = build_reconciler(settings).reconcile_batch(&batch).map_err(CliError::recon)?;
    print_json(&response, compact)
}

pub fn cmd_validate(settings: &Settings, input: PathBuf) -> Result<(), CliError> {
    let text = read_input(&input)?;
    let batch = parse_batch(&text, settings.matching.default_limit).map_err(CliError::recon)?;
    eprintln!("ok: {} {}", batch.len(), if batch.len() == 1 { "query" } else { "queries" });
    print_json(&batch_summary(&batch), false)
}

#[derive(Serialize)]
struct ValidatedQuery<'a> {
    query: &'a str,
    limit: usize,
    properties: usize,
}

fn batch_summary(batch: &QueryBatch) -> std::collections::BTreeMap<&str, ValidatedQuery<'_>> {
    batch
        .iter()
        .map(|(id, q)| {
            (id.as_str(), ValidatedQuery { query: &q.query, limit: q.limit, properties: q.properties.len() })
        })
        .collect()
}

/// `PID=VALUE`; the value is passed through as a JSON string.
pub fn parse_property(raw: &str) -> Result<PropertyValue, CliError> {
    match raw.split_once('=') {
        Some((pid, value)) if !pid.trim().is_empty() => Ok(PropertyValue::new(pid.trim(), value.trim())),
        _ => Err(CliError::args(format!("invalid --property \"{raw}\"")).with_hint("expected PID=VALUE, e.g. 'MW Connected=50'")),
    }
}

/// Read a file, or stdin when `path` is `-`.
fn read_input(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::args(format!("cannot read stdin: {e}")))?;
        return Ok(buf);
    }

    std::fs::read_to_string(path).map_err(|e| CliError::args(format!("cannot read {}: {e}", path.display())))
}

pub fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), CliError> {
    let out = if compact { serde_json::to_string(value) } else { serde_json::to_string_pretty(value) }
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{out}");
    Ok(())
}
