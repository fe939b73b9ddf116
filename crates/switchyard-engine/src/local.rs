use crate::engine::{Interceptor, Processor, Producer, RoutingEngine};
use crate::{EngineError, Message, Payload, Registry, RouteDefinition, RoutingConfigurationSet};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};
use tracing::{debug, info, trace, warn};

/// Registry name of the built-in processor that merges a `Routes` payload
/// into the engine it runs in.
pub const MERGE_ROUTES_PROCESSOR: &str = "merge-routes";

/// Upper bound on forwarding hops for a single message.
const MAX_HOPS: usize = 32;

/// Upper bound on messages sent from inside processors while one message is
/// being dispatched.
const MAX_DEFERRED: usize = 1024;

/// In-process routing engine.
///
/// Dispatch is synchronous and serialised through a single dispatch lock:
/// a message sent to the engine is fully delivered (subscribers first, then
/// every matching route, recursively) before the next one is admitted. A
/// `Routes` payload merged by the [`MERGE_ROUTES_PROCESSOR`] therefore takes
/// effect strictly between the messages sent before and after it.
///
/// A processor may send on its own engine. Such a send is queued and
/// returns immediately; the queue is drained by the thread that holds the
/// dispatch lock once its current message has been delivered.
#[derive(Clone)]
pub struct LocalEngine {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    running: AtomicBool,
    routes: RwLock<Vec<RouteDefinition>>,
    interceptors: RwLock<Vec<Arc<dyn Interceptor>>>,
    subscribers: RwLock<HashMap<String, Vec<Arc<dyn Processor>>>>,
    dispatch: Mutex<()>,
    drainer: Mutex<Option<ThreadId>>,
    deferred: Mutex<VecDeque<(String, Message)>>,
    registry: Registry,
}

/// Marks the current thread as the one draining the deferred queue, until
/// dropped.
struct Draining<'a> {
    drainer: &'a Mutex<Option<ThreadId>>,
}

impl<'a> Draining<'a> {
    fn enter(drainer: &'a Mutex<Option<ThreadId>>) -> Self {
        *lock(drainer) = Some(thread::current().id());
        Self { drainer }
    }
}

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        *lock(self.drainer) = None;
    }
}

struct MergeRoutes {
    engine: Weak<Inner>,
}

impl Processor for MergeRoutes {
    fn process(&self, message: &Message) -> Result<(), EngineError> {
        let engine = self.engine.upgrade().ok_or(EngineError::Gone)?;
        match message.body() {
            Payload::Routes(set) => {
                engine.merge(set.clone());
                Ok(())
            }
            other => Err(EngineError::UnexpectedPayload {
                address: MERGE_ROUTES_PROCESSOR.to_owned(),
                expected: "routes",
                found: other.type_name(),
            }),
        }
    }
}

struct LocalProducer {
    engine: Arc<Inner>,
}

impl Producer for LocalProducer {
    fn send(&self, address: &str, message: Message) -> Result<(), EngineError> {
        self.engine.dispatch(address, &message)
    }
}

impl LocalEngine {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let registry = Registry::new();
            let merge: Arc<dyn Processor> = Arc::new(MergeRoutes {
                engine: weak.clone(),
            });
            registry.register(MERGE_ROUTES_PROCESSOR, merge);
            Inner {
                name,
                running: AtomicBool::new(false),
                routes: RwLock::new(Vec::new()),
                interceptors: RwLock::new(Vec::new()),
                subscribers: RwLock::new(HashMap::new()),
                dispatch: Mutex::new(()),
                drainer: Mutex::new(None),
                deferred: Mutex::new(VecDeque::new()),
                registry,
            }
        });
        Self { inner }
    }

    /// The built-in route-merging processor, for registration under an
    /// additional name.
    pub fn merge_processor(&self) -> Arc<dyn Processor> {
        Arc::new(MergeRoutes {
            engine: Arc::downgrade(&self.inner),
        })
    }

    pub fn route_count(&self) -> usize {
        read(&self.inner.routes).len()
    }

    pub fn routes(&self) -> Vec<RouteDefinition> {
        read(&self.inner.routes).clone()
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new("local")
    }
}

impl Inner {
    fn merge(&self, set: RoutingConfigurationSet) {
        let count = set.len();
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(set.into_routes());
        info!("merged {count} route(s) into engine '{}'", self.name);
    }

    fn dispatch(&self, address: &str, message: &Message) -> Result<(), EngineError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(EngineError::NotRunning(self.name.clone()));
        }
        if *lock(&self.drainer) == Some(thread::current().id()) {
            trace!("'{address}' sent from inside a processor, deferred");
            lock(&self.deferred).push_back((address.to_owned(), message.clone()));
            return Ok(());
        }

        let _serial = lock(&self.dispatch);
        let _draining = Draining::enter(&self.drainer);
        let result = self.deliver(address, message, 0);
        let drained = self.drain();
        result.and(drained)
    }

    /// Deliver everything processors sent while the dispatch lock was held.
    /// Failures of deferred messages are logged; they have no caller left to
    /// report to.
    fn drain(&self) -> Result<(), EngineError> {
        let mut delivered = 0;
        loop {
            let Some((address, message)) = lock(&self.deferred).pop_front() else {
                return Ok(());
            };
            delivered += 1;
            if delivered > MAX_DEFERRED {
                lock(&self.deferred).clear();
                return Err(EngineError::RoutingLoop(address));
            }
            if let Err(e) = self.deliver(&address, &message, 0) {
                warn!("deferred message to '{address}' failed: {e}");
            }
        }
    }

    fn deliver(&self, address: &str, message: &Message, hops: usize) -> Result<(), EngineError> {
        if hops > MAX_HOPS {
            return Err(EngineError::RoutingLoop(address.to_owned()));
        }

        // Snapshot everything up front: processors may merge routes or
        // register services while this message is in flight.
        let interceptors = read(&self.interceptors).clone();
        let subscribers = read(&self.subscribers)
            .get(address)
            .cloned()
            .unwrap_or_default();
        let routes: Vec<RouteDefinition> = read(&self.routes)
            .iter()
            .filter(|r| r.matches(address, message))
            .cloned()
            .collect();

        for interceptor in &interceptors {
            interceptor.intercept(address, message);
        }

        if subscribers.is_empty() && routes.is_empty() {
            debug!("no consumer for '{address}', message dropped");
            return Ok(());
        }

        for subscriber in &subscribers {
            subscriber.process(message)?;
        }

        for route in &routes {
            if let Some(name) = &route.process {
                trace!("'{address}' -> processor '{name}'");
                let processor: Arc<dyn Processor> = self.registry.require(name)?;
                processor.process(message)?;
            }
            for next in &route.to {
                trace!("'{address}' -> '{next}'");
                self.deliver(next, message, hops + 1)?;
            }
        }
        Ok(())
    }
}

impl RoutingEngine for LocalEngine {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn start(&self) -> Result<(), EngineError> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning(self.inner.name.clone()));
        }
        info!(
            "engine '{}' started with {} route(s)",
            self.inner.name,
            self.route_count()
        );
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return Err(EngineError::NotRunning(self.inner.name.clone()));
        }
        info!("engine '{}' stopped", self.inner.name);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    fn add_routes(&self, routes: RoutingConfigurationSet) -> Result<(), EngineError> {
        self.inner.merge(routes);
        Ok(())
    }

    fn add_interceptor(&self, interceptor: Arc<dyn Interceptor>) {
        self.inner
            .interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(interceptor);
    }

    fn subscribe(&self, address: &str, processor: Arc<dyn Processor>) {
        debug!("subscribing consumer to '{address}'");
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(address.to_owned())
            .or_default()
            .push(processor);
    }

    fn create_producer(&self) -> Box<dyn Producer> {
        Box::new(LocalProducer {
            engine: Arc::clone(&self.inner),
        })
    }

    fn registry(&self) -> &Registry {
        &self.inner.registry
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
