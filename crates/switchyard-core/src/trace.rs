use crate::LifecycleError;
use std::fmt::Write as _;
use switchyard_config::{keys, ConfigError, ConfigurationView};
use switchyard_engine::{Interceptor, Message, Payload};
use tracing::Level;

/// Builds the message trace interceptor from `switchyard.trace.*`.
pub struct TraceBuilder<'a> {
    config: &'a ConfigurationView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceInterceptor {
    enabled: bool,
    level: Level,
    name: Option<String>,
    show_headers: bool,
    show_body: bool,
    show_body_type: bool,
    show_address: bool,
}

impl<'a> TraceBuilder<'a> {
    pub fn new(config: &'a ConfigurationView) -> Self {
        Self { config }
    }

    pub fn build(&self) -> Result<TraceInterceptor, LifecycleError> {
        let config = self.config;
        if !config.get_bool(keys::TRACE_ENABLED)? {
            return Ok(TraceInterceptor::disabled());
        }
        let level = match config.get(keys::TRACE_LEVEL) {
            None => Level::INFO,
            Some(raw) => parse_level(raw).ok_or_else(|| ConfigError::InvalidValue {
                key: keys::TRACE_LEVEL.to_owned(),
                value: raw.to_owned(),
                expected: "one of trace, debug, info, warn, error",
            })?,
        };
        Ok(TraceInterceptor {
            enabled: true,
            level,
            name: config.get(keys::TRACE_NAME).map(str::to_owned),
            show_headers: config.get_bool(keys::TRACE_SHOW_HEADERS)?,
            show_body: config.get_bool(keys::TRACE_SHOW_BODY)?,
            show_body_type: config.get_bool(keys::TRACE_SHOW_BODY_TYPE)?,
            show_address: config.get_bool(keys::TRACE_SHOW_ADDRESS)?,
        })
    }
}

fn parse_level(raw: &str) -> Option<Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

impl TraceInterceptor {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            level: Level::INFO,
            name: None,
            show_headers: false,
            show_body: false,
            show_body_type: false,
            show_address: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The line logged for one hop.
    pub fn format(&self, address: &str, message: &Message) -> String {
        let mut line = String::new();
        if self.show_address {
            let _ = write!(line, "address={address} ");
        }
        if self.show_headers {
            let headers: Vec<String> = message
                .headers()
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            let _ = write!(line, "headers={{{}}} ", headers.join(", "));
        }
        if self.show_body_type {
            let _ = write!(line, "body-type={} ", message.body().type_name());
        }
        if self.show_body {
            match message.body() {
                Payload::Empty => line.push_str("body=<empty>"),
                Payload::Text(text) => {
                    let _ = write!(line, "body={text}");
                }
                Payload::Routes(set) => {
                    let _ = write!(line, "body=<{} route(s)>", set.len());
                }
            }
        }
        line.trim_end().to_owned()
    }
}

impl Interceptor for TraceInterceptor {
    fn intercept(&self, address: &str, message: &Message) {
        if !self.enabled {
            return;
        }
        let line = self.format(address, message);
        let name = self.name.as_deref().unwrap_or("switchyard");
        match self.level {
            Level::TRACE => tracing::trace!(tracer = name, "{line}"),
            Level::DEBUG => tracing::debug!(tracer = name, "{line}"),
            Level::INFO => tracing::info!(tracer = name, "{line}"),
            Level::WARN => tracing::warn!(tracer = name, "{line}"),
            _ => tracing::error!(tracer = name, "{line}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_config::ConfigSource;

    fn view(pairs: &[(&str, &str)]) -> ConfigurationView {
        ConfigurationView::new(vec![
            ConfigSource::from_pairs("test", pairs.iter().copied()),
            ConfigSource::builtin_defaults().unwrap(),
        ])
    }

    #[test]
    fn disabled_by_default() {
        let tracer = TraceBuilder::new(&view(&[])).build().unwrap();
        assert!(!tracer.is_enabled());
    }

    #[test]
    fn level_parses_case_insensitively() {
        let tracer = TraceBuilder::new(&view(&[
            ("switchyard.trace.enabled", "true"),
            ("switchyard.trace.level", "DeBuG"),
            ("switchyard.trace.name", "bus"),
        ]))
        .build()
        .unwrap();
        assert!(tracer.is_enabled());
        assert_eq!(tracer.level(), Level::DEBUG);
        assert_eq!(tracer.name(), Some("bus"));
    }

    #[test]
    fn invalid_level_is_config_error() {
        let result = TraceBuilder::new(&view(&[
            ("switchyard.trace.enabled", "yes"),
            ("switchyard.trace.level", "loud"),
        ]))
        .build();
        assert!(matches!(
            result,
            Err(LifecycleError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn level_ignored_when_disabled() {
        let tracer = TraceBuilder::new(&view(&[("switchyard.trace.level", "loud")]))
            .build()
            .unwrap();
        assert!(!tracer.is_enabled());
    }

    #[test]
    fn format_follows_flags() {
        let tracer = TraceBuilder::new(&view(&[
            ("switchyard.trace.enabled", "on"),
            ("switchyard.trace.format.show-body", "true"),
            ("switchyard.trace.format.show-headers", "false"),
        ]))
        .build()
        .unwrap();
        let message = Message::new(Payload::Text("hi".to_owned())).with_header("signal", "x");
        assert_eq!(
            tracer.format("bus://a", &message),
            "address=bus://a body-type=text body=hi"
        );
    }
}
