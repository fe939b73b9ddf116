//! Well-known configuration keys.

/// Ordered list of external configuration files, split on the platform path
/// separator. Only honoured in the highest-precedence provider.
pub const CONFIGURATION_EXTERNALS: &str = "switchyard.configuration.externals";

/// Host home directory.
pub const HOME: &str = "switchyard.home";

/// Directory holding persisted route scripts replayed on launch.
pub const SCRIPT_REPOSITORY: &str = "switchyard.scripts.repository";

/// Comma separated list of accepted route script file extensions.
pub const SCRIPT_EXTENSIONS: &str = "switchyard.scripts.extensions";

/// Reference to the default bootstrap script.
pub const BOOTSTRAP_SCRIPT: &str = "switchyard.bootstrap.script";

/// Used when [`BOOTSTRAP_SCRIPT`] is not set anywhere.
pub const DEFAULT_BOOTSTRAP_SCRIPT: &str = "packaged-resource:bootstrap/control.toml";

/// Explicit, ordered list of bootstrap extension scripts.
pub const BOOTSTRAP_EXTENSIONS: &str = "switchyard.bootstrap.extensions";

/// Prefix for individually named bootstrap extension scripts, e.g.
/// `switchyard.bootstrap.extension.audit = "/etc/switchyard/audit.toml"`.
pub const BOOTSTRAP_EXTENSION_PREFIX: &str = "switchyard.bootstrap.extension.";

/// Plugin search path, split on the platform path separator.
pub const PLUGINS_PATH: &str = "switchyard.plugins.path";

pub const TRACE_ENABLED: &str = "switchyard.trace.enabled";
pub const TRACE_LEVEL: &str = "switchyard.trace.level";
pub const TRACE_NAME: &str = "switchyard.trace.name";
pub const TRACE_SHOW_HEADERS: &str = "switchyard.trace.format.show-headers";
pub const TRACE_SHOW_BODY: &str = "switchyard.trace.format.show-body";
pub const TRACE_SHOW_BODY_TYPE: &str = "switchyard.trace.format.show-body-type";
pub const TRACE_SHOW_ADDRESS: &str = "switchyard.trace.format.show-address";

/// Address of the control channel endpoint.
pub const CONTROL_CHANNEL: &str = "switchyard.channels.control";

/// Address of the termination endpoint.
pub const TERMINATION_CHANNEL: &str = "switchyard.channels.termination";

/// Header carrying the control signal on bus messages.
pub const SIGNAL_HEADER: &str = "signal";

pub const SIG_CONFIGURE: &str = "switchyard.signals.configure";
pub const SIG_TERMINATE: &str = "switchyard.signals.terminate";

pub const DEFAULT_SIG_CONFIGURE: &str = "configure";
pub const DEFAULT_SIG_TERMINATE: &str = "terminate";

/// Registry name of the processor that merges route payloads into the engine.
pub const MERGE_ROUTES_PROCESSOR: &str = "switchyard.processors.merge-routes";

/// Registry name under which the host registers its shutdown latch.
pub const SHUTDOWN_LATCH_ID: &str = "switchyard.latch";
