use crate::{EngineError, Message, Payload, Registry, RoutingConfigurationSet};
use std::sync::Arc;

/// Something that consumes messages: a subscriber bound to an address, or a
/// named processor referenced from a route.
pub trait Processor: Send + Sync {
    fn process(&self, message: &Message) -> Result<(), EngineError>;
}

impl<F> Processor for F
where
    F: Fn(&Message) -> Result<(), EngineError> + Send + Sync,
{
    fn process(&self, message: &Message) -> Result<(), EngineError> {
        self(message)
    }
}

/// Observes every hop a message takes through the engine.
pub trait Interceptor: Send + Sync {
    fn intercept(&self, address: &str, message: &Message);
}

/// Sends messages into a running engine.
pub trait Producer: Send {
    fn send(&self, address: &str, message: Message) -> Result<(), EngineError>;

    fn send_body_and_header(
        &self,
        address: &str,
        body: Payload,
        header: &str,
        value: &str,
    ) -> Result<(), EngineError> {
        self.send(address, Message::new(body).with_header(header, value))
    }
}

/// Contract of the message-routing engine hosted by a control channel.
pub trait RoutingEngine: Send + Sync {
    fn name(&self) -> &str;

    fn start(&self) -> Result<(), EngineError>;

    fn stop(&self) -> Result<(), EngineError>;

    fn is_running(&self) -> bool;

    /// Merge a set of routing rules into the engine.
    fn add_routes(&self, routes: RoutingConfigurationSet) -> Result<(), EngineError>;

    fn add_interceptor(&self, interceptor: Arc<dyn Interceptor>);

    /// Bind a consumer to an address. Subscribers see every message sent to
    /// the address, before any route is applied.
    fn subscribe(&self, address: &str, processor: Arc<dyn Processor>);

    fn create_producer(&self) -> Box<dyn Producer>;

    /// Named, typed lookup of shared services.
    fn registry(&self) -> &Registry;
}
