use crate::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One routing rule: messages arriving at `from` whose headers match every
/// `when` entry are handed to the `process` processor (if any) and then
/// forwarded to each address in `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub from: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub when: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
}

impl RouteDefinition {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            id: None,
            from: from.into(),
            when: BTreeMap::new(),
            process: None,
            to: Vec::new(),
        }
    }

    #[must_use]
    pub fn when(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.when.insert(header.into(), value.into());
        self
    }

    #[must_use]
    pub fn process(mut self, processor: impl Into<String>) -> Self {
        self.process = Some(processor.into());
        self
    }

    #[must_use]
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    pub fn matches(&self, address: &str, message: &Message) -> bool {
        self.from == address
            && self
                .when
                .iter()
                .all(|(header, expected)| message.header(header) == Some(expected.as_str()))
    }
}

/// The product of evaluating a route script.
///
/// The lifecycle layer treats this as opaque: it is handed from the
/// evaluator to the engine (directly, or as a message payload) and consumed
/// there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfigurationSet {
    routes: Vec<RouteDefinition>,
}

impl RoutingConfigurationSet {
    pub fn new(routes: Vec<RouteDefinition>) -> Self {
        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn into_routes(self) -> Vec<RouteDefinition> {
        self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_matches_address_and_headers() {
        let route = RouteDefinition::new("bus://in")
            .when("signal", "terminate")
            .to("bus://out");
        let hit = Message::empty().with_header("signal", "terminate");
        let miss = Message::empty().with_header("signal", "configure");

        assert!(route.matches("bus://in", &hit));
        assert!(!route.matches("bus://in", &miss));
        assert!(!route.matches("bus://elsewhere", &hit));
    }

    #[test]
    fn route_without_filter_matches_everything_at_address() {
        let route = RouteDefinition::new("bus://in").process("p");
        assert!(route.matches("bus://in", &Message::empty()));
    }
}
