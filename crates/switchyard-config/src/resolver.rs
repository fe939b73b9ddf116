use crate::keys::CONFIGURATION_EXTERNALS;
use crate::{ConfigError, ConfigSource, ConfigurationView};
use std::path::PathBuf;
use tracing::{debug, info};

/// Assembles the configuration stack:
/// runtime overrides > external files (in listed order) > built-in defaults.
///
/// The external file list is taken from [`CONFIGURATION_EXTERNALS`] in the
/// override source only. Any source that fails to load aborts resolution;
/// a partially merged view is never returned.
#[derive(Debug, Clone)]
pub struct ConfigurationResolver {
    overrides: ConfigSource,
    defaults: ConfigSource,
}

impl ConfigurationResolver {
    pub fn new(defaults: ConfigSource) -> Self {
        Self {
            overrides: ConfigSource::new("overrides"),
            defaults,
        }
    }

    /// Resolver over the packaged defaults.
    pub fn with_builtin_defaults() -> Result<Self, ConfigError> {
        Ok(Self::new(ConfigSource::builtin_defaults()?))
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigSource) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn resolve(self) -> Result<ConfigurationView, ConfigError> {
        info!("configuring runtime overrides ({} entries)", self.overrides.len());
        let externals = self
            .overrides
            .get(CONFIGURATION_EXTERNALS)
            .map(external_paths)
            .unwrap_or_default();

        let mut sources = Vec::with_capacity(externals.len() + 2);
        sources.push(self.overrides);
        for path in externals {
            info!("configuring external properties in {}", path.display());
            sources.push(ConfigSource::from_file(&path)?);
        }
        info!("configuring defaults from {}", self.defaults.name());
        sources.push(self.defaults);

        let view = ConfigurationView::new(sources);
        debug!("configuration sources: {:?}", view.source_names());
        Ok(view)
    }
}

/// Split the externals value on the platform path separator. Commas are
/// accepted as an additional delimiter.
fn external_paths(raw: &str) -> Vec<PathBuf> {
    std::env::split_paths(raw)
        .flat_map(|p| {
            p.to_string_lossy()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect::<Vec<_>>()
        })
        .collect()
}
