//! CLI Exit Code Registry
//!
//! Single source of truth for `repd` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | Usage error (bad args, unreadable input file)      |
//! | 3    | Registry unavailable (missing, unreadable, empty)  |
//! | 4    | Invalid request payload                            |
//! | 5    | Invalid settings file                              |

use repd_config::ConfigError;
use repd_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options, unreadable input.
pub const EXIT_USAGE: u8 = 2;

/// Registry store missing, unreadable, or empty. `health` also exits with this.
pub const EXIT_UNAVAILABLE: u8 = 3;

/// Request JSON failed to parse or validate.
pub const EXIT_INVALID_REQUEST: u8 = 4;

/// Settings file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 5;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::RegistryUnavailable(_) => EXIT_UNAVAILABLE,
        ReconError::InvalidRequest(_) | ReconError::PropertyCoercion { .. } => EXIT_INVALID_REQUEST,
        ReconError::Config(_) => EXIT_CONFIG,
        ReconError::QueryFailed { .. } => EXIT_ERROR,
    }
}

pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_CONFIG
}
