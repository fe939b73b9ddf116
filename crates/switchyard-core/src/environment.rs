use crate::{Bootstrapper, ControlChannel, Launcher, LifecycleError, ShutdownLatch};
use std::path::PathBuf;
use std::sync::Arc;
use switchyard_config::{keys, ConfigurationView};
use switchyard_engine::{LocalEngine, Processor, RoutingEngine, TomlRouteEvaluator};
use tracing::{debug, info};

/// Entries of the plugin search path, in order. Empty entries are skipped.
pub fn plugin_paths(config: &ConfigurationView) -> Vec<PathBuf> {
    config
        .get(keys::PLUGINS_PATH)
        .map(|raw| {
            std::env::split_paths(raw)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Create the home directory, the script repository and every plugin
/// directory that does not exist yet.
pub fn prepare_filesystem(config: &ConfigurationView) -> Result<(), LifecycleError> {
    let mut dirs: Vec<PathBuf> = [keys::HOME, keys::SCRIPT_REPOSITORY]
        .iter()
        .filter_map(|key| config.get(key))
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .collect();
    dirs.extend(plugin_paths(config));

    for dir in dirs {
        if !dir.is_dir() {
            debug!("creating {}", dir.display());
            std::fs::create_dir_all(&dir)?;
        }
    }
    Ok(())
}

/// A fully wired host: engine, shutdown latch, evaluator and control channel.
pub struct Host {
    engine: LocalEngine,
    channel: Arc<ControlChannel>,
    evaluator: Arc<TomlRouteEvaluator>,
}

impl Host {
    /// Build the in-process engine and wire the shutdown latch to the
    /// termination address.
    pub fn assemble(config: Arc<ConfigurationView>) -> Result<Self, LifecycleError> {
        let engine = LocalEngine::new("switchyard");

        let terminate = config.get_or(keys::SIG_TERMINATE, keys::DEFAULT_SIG_TERMINATE);
        let latch = Arc::new(ShutdownLatch::new(terminate));
        engine
            .registry()
            .register(keys::SHUTDOWN_LATCH_ID, Arc::clone(&latch));
        let termination = config.require(keys::TERMINATION_CHANNEL)?;
        engine.subscribe(termination, latch);

        let merge = config.require(keys::MERGE_ROUTES_PROCESSOR)?;
        let processor: Arc<dyn Processor> = engine.merge_processor();
        engine.registry().register(merge, processor);

        let evaluator = Arc::new(TomlRouteEvaluator::with_config(Arc::clone(&config)));
        let channel = Arc::new(ControlChannel::from_registry(
            Arc::new(engine.clone()),
            config,
        )?);
        info!("host assembled on engine '{}'", engine.name());
        Ok(Self {
            engine,
            channel,
            evaluator,
        })
    }

    pub fn engine(&self) -> &LocalEngine {
        &self.engine
    }

    pub fn channel(&self) -> &Arc<ControlChannel> {
        &self.channel
    }

    pub fn evaluator(&self) -> &Arc<TomlRouteEvaluator> {
        &self.evaluator
    }

    pub fn launcher(&self) -> Launcher {
        Launcher::new(Bootstrapper::new(self.evaluator.clone()))
    }

    /// Bootstrap, activate and replay persisted scripts.
    pub fn launch(&self) -> Result<usize, LifecycleError> {
        self.launcher().launch(&self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_config::ConfigSource;

    fn config(pairs: &[(&str, &str)]) -> Arc<ConfigurationView> {
        Arc::new(ConfigurationView::new(vec![
            ConfigSource::from_pairs("test", pairs.iter().copied()),
            ConfigSource::builtin_defaults().unwrap(),
        ]))
    }

    #[test]
    fn plugin_paths_split_on_separator() {
        let joined = std::env::join_paths(["/opt/a", "/opt/b"]).unwrap();
        let joined = joined.to_string_lossy().into_owned();
        let paths = plugin_paths(&config(&[(keys::PLUGINS_PATH, joined.as_str())]));
        assert_eq!(paths, vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]);
    }

    #[test]
    fn prepare_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        let routes = dir.path().join("home/routes");
        let plugins = dir.path().join("plugins");
        let (home_s, routes_s, plugins_s) = (
            home.to_string_lossy().into_owned(),
            routes.to_string_lossy().into_owned(),
            plugins.to_string_lossy().into_owned(),
        );
        prepare_filesystem(&config(&[
            (keys::HOME, home_s.as_str()),
            (keys::SCRIPT_REPOSITORY, routes_s.as_str()),
            (keys::PLUGINS_PATH, plugins_s.as_str()),
        ]))
        .unwrap();
        assert!(home.is_dir());
        assert!(routes.is_dir());
        assert!(plugins.is_dir());
    }

    #[test]
    fn assembled_host_registers_latch_and_merge_processor() {
        let host = Host::assemble(config(&[(keys::MERGE_ROUTES_PROCESSOR, "merge")])).unwrap();
        let registry = host.engine().registry();
        assert!(registry.contains(keys::SHUTDOWN_LATCH_ID));
        assert!(registry.contains("merge"));
        assert!(Arc::ptr_eq(
            host.channel().latch(),
            &registry
                .require::<Arc<ShutdownLatch>>(keys::SHUTDOWN_LATCH_ID)
                .unwrap()
        ));
    }
}
