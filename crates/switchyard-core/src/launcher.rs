use crate::script::{ScriptLoader, ScriptReference};
use crate::{Bootstrapper, ControlChannel, LifecycleError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use switchyard_config::{keys, ConfigurationView};
use tracing::{debug, info};

/// Start-up sequence: bootstrap, activate, then replay persisted scripts.
pub struct Launcher {
    bootstrapper: Bootstrapper,
}

impl Launcher {
    pub fn new(bootstrapper: Bootstrapper) -> Self {
        Self { bootstrapper }
    }

    /// Returns the number of persisted scripts replayed.
    pub fn launch(&self, channel: &ControlChannel) -> Result<usize, LifecycleError> {
        self.bootstrapper.bootstrap(channel)?;
        channel.activate()?;

        let scripts = persisted_scripts(channel.config())?;
        for path in &scripts {
            let loader = ScriptLoader::new(
                ScriptReference::file(path),
                Arc::clone(self.bootstrapper.evaluator()),
            );
            channel.configure(&loader)?;
        }
        info!("launched, {} persisted script(s) replayed", scripts.len());
        Ok(scripts.len())
    }
}

/// Files in the script repository with an accepted extension, in directory
/// enumeration order. A missing repository yields nothing.
pub fn persisted_scripts(config: &ConfigurationView) -> Result<Vec<PathBuf>, LifecycleError> {
    let Some(repository) = config.get(keys::SCRIPT_REPOSITORY) else {
        return Ok(Vec::new());
    };
    let repository = Path::new(repository);
    if !repository.is_dir() {
        debug!("no script repository at {}", repository.display());
        return Ok(Vec::new());
    }

    let accepted: Vec<String> = config
        .get_list(keys::SCRIPT_EXTENSIONS)
        .iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut scripts = Vec::new();
    for entry in std::fs::read_dir(repository)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| accepted.iter().any(|a| a.eq_ignore_ascii_case(e)));
        if matches {
            scripts.push(path);
        }
    }
    Ok(scripts)
}
