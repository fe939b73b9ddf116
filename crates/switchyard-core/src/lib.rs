//! Lifecycle and coordination layer for the Switchyard host.
//!
//! This crate wires a routing engine into a `ControlChannel`, loads the
//! bootstrap and extension route scripts through the `Bootstrapper`, replays
//! persisted scripts through the `Launcher`, and coordinates a one-shot,
//! cross-thread graceful shutdown through the `ShutdownLatch`. It also owns
//! host-level concerns: trace interceptor construction, filesystem
//! preparation, the home directory lock, and OS signal handling.

pub mod bootstrap;
pub mod channel;
pub mod concurrency;
pub mod environment;
pub mod latch;
pub mod launcher;
pub mod script;
pub mod trace;

pub use bootstrap::Bootstrapper;
pub use channel::ControlChannel;
pub use concurrency::{install_signal_handler, HomeLock};
pub use environment::{plugin_paths, prepare_filesystem, Host};
pub use latch::ShutdownLatch;
pub use launcher::Launcher;
pub use script::{RouteLoader, ScriptLoader, ScriptReference, ScriptScheme, PACKAGED_SCRIPTS};
pub use trace::{TraceBuilder, TraceInterceptor};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("precondition violated: {0}")]
    Precondition(String),
    #[error("configuration error: {0}")]
    Config(#[from] switchyard_config::ConfigError),
    #[error("failed to read script '{reference}': {source}")]
    ScriptIo {
        reference: String,
        #[source]
        source: std::io::Error,
    },
    #[error("packaged resource not found: {0}")]
    ResourceNotFound(String),
    #[error("failed to evaluate script '{reference}': {source}")]
    Evaluation {
        reference: String,
        #[source]
        source: switchyard_engine::ScriptError,
    },
    #[error("engine error: {0}")]
    Engine(#[from] switchyard_engine::EngineError),
    #[error("interrupted while waiting: {0}")]
    Interrupted(String),
    #[error("control channel has been destroyed")]
    Destroyed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("home directory '{0}' is locked by another host")]
    Lock(String),
}
