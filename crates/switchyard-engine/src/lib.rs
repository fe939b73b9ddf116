//! Routing engine and script evaluator contracts for Switchyard.
//!
//! The lifecycle layer treats the message-routing engine and the script
//! evaluator as external collaborators. This crate defines their contracts
//! (`RoutingEngine`, `ScriptEvaluator`, `Processor`, `Interceptor`, `Producer`),
//! the opaque `RoutingConfigurationSet` that flows between them, and a typed
//! name `Registry`. It also ships an in-process `LocalEngine`, a declarative
//! `TomlRouteEvaluator`, and a recording `MockEngine` for tests.

pub mod engine;
pub mod local;
pub mod message;
pub mod mock;
pub mod registry;
pub mod routes;
pub mod script;

pub use engine::{Interceptor, Processor, Producer, RoutingEngine};
pub use local::LocalEngine;
pub use message::{Message, Payload};
pub use mock::MockEngine;
pub use registry::Registry;
pub use routes::{RouteDefinition, RoutingConfigurationSet};
pub use script::{ScriptEvaluator, TomlRouteEvaluator};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine '{0}' is not running")]
    NotRunning(String),
    #[error("engine '{0}' is already running")]
    AlreadyRunning(String),
    #[error("nothing of the requested type is registered under '{0}'")]
    NotRegistered(String),
    #[error("routing loop detected at '{0}'")]
    RoutingLoop(String),
    #[error("unexpected payload at '{address}': expected {expected}, found {found}")]
    UnexpectedPayload {
        address: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("engine is no longer available")]
    Gone,
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to parse route script: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unresolved placeholder '${{{0}}}'")]
    UnresolvedPlaceholder(String),
    #[error("unterminated placeholder at byte {0}")]
    UnterminatedPlaceholder(usize),
    #[error("invalid route #{index}: {reason}")]
    InvalidRoute { index: usize, reason: String },
}
