//! Layered configuration for the Switchyard host.
//!
//! Configuration is a precedence-ordered stack of key/value providers
//! (`ConfigSource`): runtime overrides first, then any external TOML files named
//! by `switchyard.configuration.externals`, then the packaged defaults. The
//! `ConfigurationResolver` assembles the stack and hands back a read-only
//! `ConfigurationView`. Well-known key names live in [`keys`].

pub mod keys;
pub mod resolver;
pub mod source;
pub mod view;

pub use resolver::ConfigurationResolver;
pub use source::{ConfigSource, BUILTIN_DEFAULTS};
pub use view::ConfigurationView;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration source '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration source '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid definition '{0}', expected '<key>=<value>'")]
    InvalidDefinition(String),
    #[error("invalid value for '{key}': '{value}' (expected {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error("required configuration key '{0}' is not set")]
    Missing(String),
}
