use crate::script::RouteLoader;
use crate::trace::{TraceBuilder, TraceInterceptor};
use crate::{LifecycleError, ShutdownLatch};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use switchyard_config::{keys, ConfigurationView};
use switchyard_engine::{Payload, RoutingConfigurationSet, RoutingEngine};
use tracing::{debug, info, warn};

const IDLE: u8 = 0;
const ACTIVE: u8 = 1;
const DESTROYED: u8 = 2;

/// Host of the routing engine.
///
/// Owns one engine, one shutdown latch and one configuration view for the
/// lifetime of the process. Lifecycle is `idle -> active -> destroyed`; a
/// destroyed channel cannot be reused.
///
/// `activate`, `configure` and `destroy` must not be called concurrently with
/// one another. The channel does not lock; debug builds assert on overlap.
pub struct ControlChannel {
    engine: Arc<dyn RoutingEngine>,
    config: Arc<ConfigurationView>,
    latch: Arc<ShutdownLatch>,
    state: AtomicU8,
    tracer: OnceLock<Arc<TraceInterceptor>>,
    in_transition: AtomicBool,
}

impl ControlChannel {
    pub fn new(
        engine: Arc<dyn RoutingEngine>,
        config: Arc<ConfigurationView>,
        latch: Arc<ShutdownLatch>,
    ) -> Self {
        Self {
            engine,
            config,
            latch,
            state: AtomicU8::new(IDLE),
            tracer: OnceLock::new(),
            in_transition: AtomicBool::new(false),
        }
    }

    /// Take the shutdown latch from the engine registry instead of having it
    /// passed in.
    pub fn from_registry(
        engine: Arc<dyn RoutingEngine>,
        config: Arc<ConfigurationView>,
    ) -> Result<Self, LifecycleError> {
        let latch = engine
            .registry()
            .lookup::<Arc<ShutdownLatch>>(keys::SHUTDOWN_LATCH_ID)
            .ok_or_else(|| {
                LifecycleError::Precondition(format!(
                    "no shutdown latch registered under '{}'",
                    keys::SHUTDOWN_LATCH_ID
                ))
            })?;
        Ok(Self::new(engine, config, latch))
    }

    pub fn config(&self) -> &Arc<ConfigurationView> {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn RoutingEngine> {
        &self.engine
    }

    pub fn latch(&self) -> &Arc<ShutdownLatch> {
        &self.latch
    }

    /// The trace interceptor attached by `activate`.
    pub fn tracer(&self) -> Option<&Arc<TraceInterceptor>> {
        self.tracer.get()
    }

    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::SeqCst) == ACTIVE
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.load(Ordering::SeqCst) == DESTROYED
    }

    /// Typed lookup in the engine registry.
    pub fn lookup<T: Any + Send + Sync + Clone>(&self, name: &str) -> Option<T> {
        self.engine.registry().lookup(name)
    }

    /// Merge a set of routes straight into the engine.
    pub fn load(&self, loader: &dyn RouteLoader) -> Result<(), LifecycleError> {
        self.ensure_usable()?;
        let set = loader.load()?;
        debug!("loading {} route(s) into the engine", set.len());
        self.engine.add_routes(set)?;
        Ok(())
    }

    /// Send a set of routes to the control address, to be merged by whatever
    /// routes the running engine has bound there.
    pub fn configure(&self, loader: &dyn RouteLoader) -> Result<(), LifecycleError> {
        self.ensure_usable()?;
        let set = loader.load()?;
        self.configure_set(set)
    }

    pub fn configure_set(&self, set: RoutingConfigurationSet) -> Result<(), LifecycleError> {
        self.ensure_usable()?;
        let _writer = Transition::enter(&self.in_transition);
        let address = self.config.require(keys::CONTROL_CHANNEL)?;
        let tag = self
            .config
            .get_or(keys::SIG_CONFIGURE, keys::DEFAULT_SIG_CONFIGURE);
        debug!("sending {} route(s) to '{address}'", set.len());
        self.engine.create_producer().send_body_and_header(
            address,
            Payload::Routes(set),
            keys::SIGNAL_HEADER,
            tag,
        )?;
        Ok(())
    }

    /// Attach the trace interceptor and start the engine. The interceptor is
    /// attached once, even if a failed start is retried.
    pub fn activate(&self) -> Result<(), LifecycleError> {
        self.ensure_usable()?;
        if self.is_active() {
            return Err(LifecycleError::Precondition(
                "control channel is already active".to_owned(),
            ));
        }
        let _writer = Transition::enter(&self.in_transition);
        if self.tracer.get().is_none() {
            let tracer = Arc::new(TraceBuilder::new(&self.config).build()?);
            self.engine.add_interceptor(tracer.clone());
            if self.tracer.set(tracer).is_err() {
                warn!("trace interceptor attached concurrently");
            }
        }
        self.engine.start()?;
        self.state.store(ACTIVE, Ordering::SeqCst);
        info!("control channel active on engine '{}'", self.engine.name());
        Ok(())
    }

    /// Stop the engine. The channel cannot be used again afterwards, even if
    /// stopping fails.
    pub fn destroy(&self) -> Result<(), LifecycleError> {
        let _writer = Transition::enter(&self.in_transition);
        let previous = self.state.swap(DESTROYED, Ordering::SeqCst);
        if previous == DESTROYED {
            return Err(LifecycleError::Destroyed);
        }
        self.engine.stop()?;
        info!("control channel destroyed");
        Ok(())
    }

    /// Fire-and-forget terminate signal to the termination address.
    pub fn send_shutdown_signal(&self) -> Result<(), LifecycleError> {
        let address = self.config.require(keys::TERMINATION_CHANNEL)?;
        let tag = self
            .config
            .get_or(keys::SIG_TERMINATE, keys::DEFAULT_SIG_TERMINATE);
        debug!("sending '{tag}' to '{address}'");
        self.engine.create_producer().send_body_and_header(
            address,
            Payload::Empty,
            keys::SIGNAL_HEADER,
            tag,
        )?;
        Ok(())
    }

    /// Block until the latch triggers, then destroy the channel.
    pub fn wait_shutdown(&self) -> Result<(), LifecycleError> {
        self.latch.wait()?;
        self.destroy()
    }

    /// Like [`wait_shutdown`](Self::wait_shutdown), bounded by `millis`. On a
    /// timeout the channel is left untouched and `false` is returned.
    pub fn wait_shutdown_timeout(&self, millis: u64) -> Result<bool, LifecycleError> {
        if !self.latch.wait_timeout(millis)? {
            debug!("no termination signal within {millis}ms");
            return Ok(false);
        }
        self.destroy()?;
        Ok(true)
    }

    pub fn send_shutdown_signal_and_wait(&self) -> Result<(), LifecycleError> {
        self.send_shutdown_signal()?;
        self.wait_shutdown()
    }

    pub fn send_shutdown_signal_and_wait_timeout(
        &self,
        millis: u64,
    ) -> Result<bool, LifecycleError> {
        self.send_shutdown_signal()?;
        self.wait_shutdown_timeout(millis)
    }

    fn ensure_usable(&self) -> Result<(), LifecycleError> {
        if self.is_destroyed() {
            return Err(LifecycleError::Destroyed);
        }
        Ok(())
    }
}

/// Debug-only marker for the single-writer contract.
struct Transition<'a> {
    flag: &'a AtomicBool,
}

impl<'a> Transition<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        let overlapping = flag.swap(true, Ordering::SeqCst);
        debug_assert!(
            !overlapping,
            "control channel lifecycle methods called concurrently"
        );
        Self { flag }
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
