pub mod check_script;
pub mod completions;
pub mod config;
pub mod man_pages;
pub mod run;
pub mod scripts;

use std::sync::Arc;
use switchyard_config::{ConfigError, ConfigSource, ConfigurationResolver, ConfigurationView};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_TIMEOUT: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

fn config_error(e: &ConfigError) -> String {
    format!("configuration error: {e}")
}

/// Resolve configuration from `-D` overrides, external files and the
/// packaged defaults.
pub fn resolve_config(defines: &[String]) -> Result<Arc<ConfigurationView>, String> {
    let overrides =
        ConfigSource::from_definitions("overrides", defines).map_err(|e| config_error(&e))?;
    let view = ConfigurationResolver::with_builtin_defaults()
        .and_then(|r| r.with_overrides(overrides).resolve())
        .map_err(|e| config_error(&e))?;
    Ok(Arc::new(view))
}
