// Configuration loading

pub mod settings;

pub use settings::{ConfigError, LoggingSettings, RegistrySettings, Settings};
