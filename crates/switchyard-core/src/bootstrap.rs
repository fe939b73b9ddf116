use crate::script::{ScriptLoader, ScriptReference};
use crate::{ControlChannel, LifecycleError};
use std::sync::Arc;
use switchyard_config::{keys, ConfigurationView};
use switchyard_engine::ScriptEvaluator;
use tracing::info;

/// Loads the bootstrap script and then every extension script into a
/// control channel.
///
/// The first failing script aborts the sequence; routes merged by earlier
/// scripts stay in the engine.
pub struct Bootstrapper {
    evaluator: Arc<dyn ScriptEvaluator>,
}

impl Bootstrapper {
    pub fn new(evaluator: Arc<dyn ScriptEvaluator>) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &Arc<dyn ScriptEvaluator> {
        &self.evaluator
    }

    pub fn bootstrap(&self, channel: &ControlChannel) -> Result<(), LifecycleError> {
        let config = channel.config();
        let default = config.get_or(keys::BOOTSTRAP_SCRIPT, keys::DEFAULT_BOOTSTRAP_SCRIPT);
        self.load(channel, default)?;

        let extensions = extension_references(config);
        for reference in &extensions {
            self.load(channel, reference)?;
        }
        info!("bootstrap complete, {} extension(s)", extensions.len());
        Ok(())
    }

    fn load(&self, channel: &ControlChannel, reference: &str) -> Result<(), LifecycleError> {
        let reference = ScriptReference::parse(reference)?;
        channel.load(&ScriptLoader::new(reference, Arc::clone(&self.evaluator)))
    }
}

/// Extension script references in load order: the explicit ordered list
/// first, then the prefix-keyed entries in configuration key order.
pub fn extension_references(config: &ConfigurationView) -> Vec<String> {
    let mut refs = config.get_list(keys::BOOTSTRAP_EXTENSIONS);
    refs.extend(
        config
            .keys_with_prefix(keys::BOOTSTRAP_EXTENSION_PREFIX)
            .into_iter()
            .filter_map(|key| config.get(key))
            .map(str::to_owned),
    );
    refs
}
