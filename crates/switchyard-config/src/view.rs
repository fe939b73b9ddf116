use crate::{ConfigError, ConfigSource};
use std::collections::HashSet;
use std::str::FromStr;

/// Read-only, precedence-ordered view over a stack of [`ConfigSource`]s.
///
/// A lookup returns the value from the first source (in construction order)
/// that defines the key. Key enumeration is deterministic: sources are
/// visited in precedence order and each source yields its keys in
/// declaration order, with shadowed duplicates skipped.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationView {
    sources: Vec<ConfigSource>,
}

impl ConfigurationView {
    pub fn new(sources: Vec<ConfigSource>) -> Self {
        Self { sources }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.sources.iter().find_map(|s| s.get(key))
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::Missing(key.to_owned()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Parse the value of `key`. `Ok(None)` when the key is not set.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_owned(),
                    value: raw.to_owned(),
                    expected: std::any::type_name::<T>(),
                }),
        }
    }

    /// Boolean flag; an unset key reads as `false`.
    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(false);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_owned(),
                value: raw.to_owned(),
                expected: "a boolean",
            }),
        }
    }

    /// Comma separated list; entries are trimmed and empties dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every distinct key, precedence order first, declaration order second.
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.sources
            .iter()
            .flat_map(ConfigSource::keys)
            .filter(|k| seen.insert(*k))
            .collect()
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(ConfigSource::name).collect()
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ConfigurationView {
        ConfigurationView::new(vec![
            ConfigSource::from_pairs("overrides", [("k", "override"), ("only.o", "o")]),
            ConfigSource::from_pairs("file-a", [("k", "a"), ("only.a", "a"), ("x.2", "a")]),
            ConfigSource::from_pairs("defaults", [("k", "default"), ("x.1", "d"), ("x.2", "d")]),
        ])
    }

    #[test]
    fn earliest_source_wins() {
        let v = view();
        assert_eq!(v.get("k"), Some("override"));
        assert_eq!(v.get("only.a"), Some("a"));
        assert_eq!(v.get("x.1"), Some("d"));
        assert_eq!(v.get("x.2"), Some("a"));
        assert_eq!(v.get("absent"), None);
    }

    #[test]
    fn keys_are_distinct_and_ordered() {
        let v = view();
        assert_eq!(
            v.keys(),
            vec!["k", "only.o", "only.a", "x.2", "x.1"]
        );
        assert_eq!(v.keys_with_prefix("x."), vec!["x.2", "x.1"]);
    }

    #[test]
    fn require_reports_missing_key() {
        assert!(matches!(
            view().require("nope"),
            Err(ConfigError::Missing(k)) if k == "nope"
        ));
    }

    #[test]
    fn parse_typed_values() {
        let v = ConfigurationView::new(vec![ConfigSource::from_pairs(
            "p",
            [("port", "8080"), ("bad", "eighty")],
        )]);
        assert_eq!(v.parse::<u16>("port").unwrap(), Some(8080));
        assert_eq!(v.parse::<u16>("unset").unwrap(), None);
        assert!(matches!(
            v.parse::<u16>("bad"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn booleans_accept_common_spellings() {
        let v = ConfigurationView::new(vec![ConfigSource::from_pairs(
            "p",
            [("a", "TRUE"), ("b", "off"), ("c", "1"), ("d", "perhaps")],
        )]);
        assert!(v.get_bool("a").unwrap());
        assert!(!v.get_bool("b").unwrap());
        assert!(v.get_bool("c").unwrap());
        assert!(!v.get_bool("unset").unwrap());
        assert!(v.get_bool("d").is_err());
    }

    #[test]
    fn lists_are_trimmed() {
        let v = ConfigurationView::new(vec![ConfigSource::from_pairs(
            "p",
            [("exts", " toml, .routes ,,")],
        )]);
        assert_eq!(v.get_list("exts"), vec!["toml", ".routes"]);
        assert!(v.get_list("unset").is_empty());
    }
}
