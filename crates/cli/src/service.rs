//! `repd manifest` and `repd health`.

use repd_config::Settings;
use repd_io::open_loader;
use repd_recon::protocol::{HealthReport, ServiceManifest};

use crate::exit_codes::EXIT_UNAVAILABLE;
use crate::reconcile::print_json;
use crate::CliError;

pub fn cmd_manifest() -> Result<(), CliError> {
    print_json(&ServiceManifest::default(), false)
}

/// Prints the report either way; exits `EXIT_UNAVAILABLE` when the store is missing.
pub fn cmd_health(settings: &Settings) -> Result<(), CliError> {
    let report = health_report(settings);
    print_json(&report, false)?;

    if report.is_ok() {
        Ok(())
    } else {
        Err(CliError { code: EXIT_UNAVAILABLE, message: String::new(), hint: None })
    }
}

fn health_report(settings: &Settings) -> HealthReport {
    let path = settings.registry.effective_path();
    let loader = open_loader(settings.registry.effective_format(), &path);

    if !loader.exists() {
        tracing::warn!(path = %path.display(), "registry not found");
        return HealthReport::missing();
    }

    match loader.count() {
        Ok(n) => HealthReport::connected(n),
        Err(e) => {
            tracing::warn!(error = %e, "registry unreadable");
            HealthReport::missing()
        }
    }
}
