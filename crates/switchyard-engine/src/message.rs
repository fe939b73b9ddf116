use crate::RoutingConfigurationSet;
use std::collections::BTreeMap;

/// Body of a bus message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
    Routes(RoutingConfigurationSet),
}

impl Payload {
    pub fn type_name(&self) -> &'static str {
        match self {
            Payload::Empty => "empty",
            Payload::Text(_) => "text",
            Payload::Routes(_) => "routes",
        }
    }
}

/// A message on the in-process bus: string headers plus a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    headers: BTreeMap<String, String>,
    body: Payload,
}

impl Message {
    pub fn new(body: Payload) -> Self {
        Self {
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &Payload {
        &self.body
    }

    pub fn into_body(self) -> Payload {
        self.body
    }
}
