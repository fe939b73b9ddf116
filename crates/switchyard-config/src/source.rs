use crate::ConfigError;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Packaged default configuration, compiled into every binary.
pub const BUILTIN_DEFAULTS: &str = include_str!("defaults.toml");

/// A named, ordered set of key/value pairs.
///
/// Keys keep the order in which they were declared. Nested TOML tables are
/// flattened to dotted keys, so `[switchyard.trace] enabled = true` and
/// `"switchyard.trace.enabled" = true` describe the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    name: String,
    entries: Vec<(String, String)>,
}

impl ConfigSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Build a source from explicit pairs. A repeated key replaces the
    /// earlier value but keeps its original position.
    pub fn from_pairs<I, K, V>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = Self::new(name);
        for (key, value) in pairs {
            source.insert(key, value);
        }
        source
    }

    /// Build the runtime override source from `key=value` definitions, as
    /// passed with `-D` on the command line.
    pub fn from_definitions<S: AsRef<str>>(
        name: impl Into<String>,
        definitions: &[S],
    ) -> Result<Self, ConfigError> {
        let mut source = Self::new(name);
        for def in definitions {
            let def = def.as_ref();
            let (key, value) = def
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidDefinition(def.to_owned()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::InvalidDefinition(def.to_owned()));
            }
            source.insert(key, value);
        }
        Ok(source)
    }

    pub fn from_toml_str(name: impl Into<String>, input: &str) -> Result<Self, ConfigError> {
        let name = name.into();
        let table: toml::Table = input.parse().map_err(|e| ConfigError::Parse {
            name: name.clone(),
            source: e,
        })?;
        let mut source = Self::new(name);
        flatten_into(&mut source, None, &table);
        Ok(source)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(path.display().to_string(), &content)
    }

    /// The packaged defaults.
    pub fn builtin_defaults() -> Result<Self, ConfigError> {
        Self::from_toml_str("builtin-defaults", BUILTIN_DEFAULTS)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flatten_into(source: &mut ConfigSource, prefix: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        let full_key = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(nested) => flatten_into(source, Some(&full_key), nested),
            other => {
                let rendered = render_scalar(other);
                debug!("{}: {full_key} = {rendered}", source.name);
                source.insert(full_key, rendered);
            }
        }
    }
}

// Arrays are stored comma separated, matching how list values are read back.
fn render_scalar(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items
            .iter()
            .map(render_scalar)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_tables() {
        let source = ConfigSource::from_toml_str(
            "test",
            r#"
[switchyard.trace]
enabled = true
level = "debug"

[switchyard.trace.format]
show-body = false
"#,
        )
        .unwrap();
        assert_eq!(source.get("switchyard.trace.enabled"), Some("true"));
        assert_eq!(source.get("switchyard.trace.level"), Some("debug"));
        assert_eq!(source.get("switchyard.trace.format.show-body"), Some("false"));
    }

    #[test]
    fn quoted_dotted_keys_match_tables() {
        let source =
            ConfigSource::from_toml_str("test", r#""switchyard.home" = "/srv/yard""#).unwrap();
        assert_eq!(source.get("switchyard.home"), Some("/srv/yard"));
    }

    #[test]
    fn arrays_render_comma_separated() {
        let source =
            ConfigSource::from_toml_str("test", r#"exts = ["toml", "routes"]"#).unwrap();
        assert_eq!(source.get("exts"), Some("toml,routes"));
    }

    #[test]
    fn keys_keep_declaration_order() {
        let source = ConfigSource::from_toml_str(
            "test",
            r#"
zeta = "1"
alpha = "2"
mid = "3"
"#,
        )
        .unwrap();
        let keys: Vec<_> = source.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn definitions_parse_key_value() {
        let source =
            ConfigSource::from_definitions("overrides", &["a.b=1", "c= spaced ", "d=x=y"])
                .unwrap();
        assert_eq!(source.get("a.b"), Some("1"));
        assert_eq!(source.get("c"), Some(" spaced "));
        assert_eq!(source.get("d"), Some("x=y"));
    }

    #[test]
    fn definitions_reject_missing_separator() {
        assert!(matches!(
            ConfigSource::from_definitions("overrides", &["novalue"]),
            Err(ConfigError::InvalidDefinition(_))
        ));
        assert!(ConfigSource::from_definitions("overrides", &["=value"]).is_err());
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut source = ConfigSource::from_pairs("p", [("a", "1"), ("b", "2")]);
        source.insert("a", "3");
        assert_eq!(source.get("a"), Some("3"));
        assert_eq!(source.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            ConfigSource::from_toml_str("bad", "this is = = not toml"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ConfigSource::from_file(dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn builtin_defaults_parse() {
        let defaults = ConfigSource::builtin_defaults().unwrap();
        assert_eq!(
            defaults.get(crate::keys::CONTROL_CHANNEL),
            Some("switchyard://control")
        );
        assert_eq!(
            defaults.get(crate::keys::BOOTSTRAP_SCRIPT),
            Some(crate::keys::DEFAULT_BOOTSTRAP_SCRIPT)
        );
        assert_eq!(defaults.get(crate::keys::TRACE_ENABLED), Some("false"));
    }
}
