use crate::engine::{Interceptor, Processor, Producer, RoutingEngine};
use crate::{EngineError, Message, Registry, RoutingConfigurationSet};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Recording engine for tests.
///
/// Every call is counted. Sent messages are recorded and handed to the
/// subscribers bound to their address, whether or not the engine is running;
/// routes are recorded but never applied.
#[derive(Clone, Default)]
pub struct MockEngine {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    state: Mutex<MockState>,
    registry: Registry,
}

#[derive(Default)]
struct MockState {
    running: bool,
    starts: usize,
    stops: usize,
    fail_start: bool,
    fail_stop: bool,
    added: Vec<RoutingConfigurationSet>,
    sent: Vec<(String, Message)>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    subscribers: HashMap<String, Vec<Arc<dyn Processor>>>,
}

struct MockProducer {
    engine: Arc<MockInner>,
}

impl Producer for MockProducer {
    fn send(&self, address: &str, message: Message) -> Result<(), EngineError> {
        let subscribers = {
            let mut state = self.engine.lock();
            state.sent.push((address.to_owned(), message.clone()));
            state.subscribers.get(address).cloned().unwrap_or_default()
        };
        for subscriber in subscribers {
            subscriber.process(&message)?;
        }
        Ok(())
    }
}

impl MockInner {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `start` fail.
    pub fn fail_on_start(&self) {
        self.inner.lock().fail_start = true;
    }

    /// Make every subsequent `stop` fail.
    pub fn fail_on_stop(&self) {
        self.inner.lock().fail_stop = true;
    }

    pub fn start_count(&self) -> usize {
        self.inner.lock().starts
    }

    pub fn stop_count(&self) -> usize {
        self.inner.lock().stops
    }

    pub fn added_sets(&self) -> Vec<RoutingConfigurationSet> {
        self.inner.lock().added.clone()
    }

    pub fn sent_messages(&self) -> Vec<(String, Message)> {
        self.inner.lock().sent.clone()
    }

    pub fn interceptor_count(&self) -> usize {
        self.inner.lock().interceptors.len()
    }
}

impl RoutingEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn start(&self) -> Result<(), EngineError> {
        let mut state = self.inner.lock();
        state.starts += 1;
        if state.fail_start {
            return Err(EngineError::ProcessingFailed("mock start failure".to_owned()));
        }
        state.running = true;
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        let mut state = self.inner.lock();
        state.stops += 1;
        if state.fail_stop {
            return Err(EngineError::ProcessingFailed("mock stop failure".to_owned()));
        }
        state.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    fn add_routes(&self, routes: RoutingConfigurationSet) -> Result<(), EngineError> {
        self.inner.lock().added.push(routes);
        Ok(())
    }

    fn add_interceptor(&self, interceptor: Arc<dyn Interceptor>) {
        self.inner.lock().interceptors.push(interceptor);
    }

    fn subscribe(&self, address: &str, processor: Arc<dyn Processor>) {
        self.inner
            .lock()
            .subscribers
            .entry(address.to_owned())
            .or_default()
            .push(processor);
    }

    fn create_producer(&self) -> Box<dyn Producer> {
        Box::new(MockProducer {
            engine: Arc::clone(&self.inner),
        })
    }

    fn registry(&self) -> &Registry {
        &self.inner.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Payload, RouteDefinition};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn mock_lifecycle_counts() {
        let engine = MockEngine::new();
        engine.start().unwrap();
        assert!(engine.is_running());
        engine.stop().unwrap();
        assert!(!engine.is_running());
        assert_eq!(engine.start_count(), 1);
        assert_eq!(engine.stop_count(), 1);
    }

    #[test]
    fn mock_failure_injection() {
        let engine = MockEngine::new();
        engine.fail_on_start();
        engine.fail_on_stop();
        assert!(engine.start().is_err());
        assert!(engine.stop().is_err());
        assert_eq!(engine.start_count(), 1);
        assert_eq!(engine.stop_count(), 1);
    }

    #[test]
    fn mock_records_routes_and_messages() {
        let engine = MockEngine::new();
        engine
            .add_routes(RoutingConfigurationSet::new(vec![
                RouteDefinition::new("a").to("b"),
            ]))
            .unwrap();
        engine
            .create_producer()
            .send_body_and_header("a", Payload::Empty, "signal", "x")
            .unwrap();

        assert_eq!(engine.added_sets().len(), 1);
        let sent = engine.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "a");
        assert_eq!(sent[0].1.header("signal"), Some("x"));
    }

    #[test]
    fn mock_delivers_to_subscribers() {
        let engine = MockEngine::new();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        engine.subscribe(
            "a",
            Arc::new(move |_: &Message| -> Result<(), EngineError> {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        let producer = engine.create_producer();
        producer.send("a", Message::empty()).unwrap();
        producer.send("b", Message::empty()).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
