use crate::{RouteDefinition, RoutingConfigurationSet, ScriptError};
use serde::Deserialize;
use std::sync::Arc;
use switchyard_config::ConfigurationView;

/// Turns route script text into a [`RoutingConfigurationSet`].
pub trait ScriptEvaluator: Send + Sync {
    fn evaluate(&self, source: &str) -> Result<RoutingConfigurationSet, ScriptError>;
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteScript {
    #[serde(default)]
    route: Vec<RouteDefinition>,
}

/// Evaluates declarative TOML route scripts:
///
/// ```toml
/// [[route]]
/// from = "${switchyard.channels.control}"
/// when = { signal = "${switchyard.signals.terminate}" }
/// to = ["${switchyard.channels.termination}"]
/// ```
///
/// `${key}` placeholders are substituted from the configuration view before
/// the script is parsed.
#[derive(Debug, Clone, Default)]
pub struct TomlRouteEvaluator {
    config: Option<Arc<ConfigurationView>>,
}

impl TomlRouteEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Arc<ConfigurationView>) -> Self {
        Self {
            config: Some(config),
        }
    }

    fn interpolate(&self, source: &str) -> Result<String, ScriptError> {
        let mut out = String::with_capacity(source.len());
        let mut rest = source;
        let mut offset = 0;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or(ScriptError::UnterminatedPlaceholder(offset + start))?;
            let key = after[..end].trim();
            let value = self
                .config
                .as_deref()
                .and_then(|c| c.get(key))
                .ok_or_else(|| ScriptError::UnresolvedPlaceholder(key.to_owned()))?;
            out.push_str(value);
            let consumed = start + 2 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl ScriptEvaluator for TomlRouteEvaluator {
    fn evaluate(&self, source: &str) -> Result<RoutingConfigurationSet, ScriptError> {
        let expanded = self.interpolate(source)?;
        let script: RouteScript = toml::from_str(&expanded)?;
        for (index, route) in script.route.iter().enumerate() {
            if route.from.trim().is_empty() {
                return Err(ScriptError::InvalidRoute {
                    index,
                    reason: "'from' must not be empty".to_owned(),
                });
            }
            if route.process.is_none() && route.to.is_empty() {
                return Err(ScriptError::InvalidRoute {
                    index,
                    reason: format!("route from '{}' has neither 'process' nor 'to'", route.from),
                });
            }
        }
        Ok(RoutingConfigurationSet::new(script.route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_config::ConfigSource;

    fn config() -> Arc<ConfigurationView> {
        Arc::new(ConfigurationView::new(vec![ConfigSource::from_pairs(
            "test",
            [
                ("switchyard.channels.control", "bus://control"),
                ("switchyard.signals.terminate", "terminate"),
            ],
        )]))
    }

    #[test]
    fn evaluates_routes() {
        let set = TomlRouteEvaluator::new()
            .evaluate(
                r#"
[[route]]
id = "forward"
from = "bus://a"
to = ["bus://b", "bus://c"]

[[route]]
from = "bus://b"
when = { signal = "configure" }
process = "merge-routes"
"#,
            )
            .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.routes()[0].id.as_deref(), Some("forward"));
        assert_eq!(set.routes()[0].to.len(), 2);
        assert_eq!(set.routes()[1].process.as_deref(), Some("merge-routes"));
    }

    #[test]
    fn empty_script_yields_empty_set() {
        let set = TomlRouteEvaluator::new().evaluate("# nothing here\n").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn placeholders_resolve_from_config() {
        let set = TomlRouteEvaluator::with_config(config())
            .evaluate(
                r#"
[[route]]
from = "${switchyard.channels.control}"
when = { signal = "${ switchyard.signals.terminate }" }
to = ["bus://end"]
"#,
            )
            .unwrap();
        let route = &set.routes()[0];
        assert_eq!(route.from, "bus://control");
        assert_eq!(route.when.get("signal").map(String::as_str), Some("terminate"));
    }

    #[test]
    fn unknown_placeholder_fails() {
        let result = TomlRouteEvaluator::with_config(config()).evaluate(
            r#"
[[route]]
from = "${switchyard.nope}"
to = ["bus://end"]
"#,
        );
        assert!(matches!(
            result,
            Err(ScriptError::UnresolvedPlaceholder(k)) if k == "switchyard.nope"
        ));
    }

    #[test]
    fn unterminated_placeholder_fails() {
        let result = TomlRouteEvaluator::with_config(config()).evaluate("from = \"${oops\"");
        assert!(matches!(result, Err(ScriptError::UnterminatedPlaceholder(_))));
    }

    #[test]
    fn rejects_route_without_target() {
        let result = TomlRouteEvaluator::new().evaluate(
            r#"
[[route]]
from = "bus://a"
"#,
        );
        assert!(matches!(
            result,
            Err(ScriptError::InvalidRoute { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = TomlRouteEvaluator::new().evaluate(
            r#"
[[route]]
from = "bus://a"
to = ["bus://b"]
priority = 3
"#,
        );
        assert!(matches!(result, Err(ScriptError::Parse(_))));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        assert!(matches!(
            TomlRouteEvaluator::new().evaluate("[[route]\nfrom ="),
            Err(ScriptError::Parse(_))
        ));
    }
}
