use super::{json_pretty, EXIT_SUCCESS};
use serde::Serialize;
use switchyard_config::ConfigurationView;

#[derive(Serialize)]
struct Entry<'a> {
    key: &'a str,
    value: &'a str,
    source: &'a str,
}

fn entry<'a>(config: &'a ConfigurationView, key: &'a str) -> Option<Entry<'a>> {
    config
        .sources()
        .iter()
        .find_map(|s| s.get(key).map(|value| (s.name(), value)))
        .map(|(source, value)| Entry { key, value, source })
}

pub fn run(config: &ConfigurationView, key: Option<&str>, json: bool) -> Result<u8, String> {
    if let Some(key) = key {
        let entry = entry(config, key)
            .ok_or_else(|| format!("configuration error: key '{key}' is not set"))?;
        if json {
            println!("{}", json_pretty(&entry)?);
        } else {
            println!("{}", entry.value);
        }
        return Ok(EXIT_SUCCESS);
    }

    let entries: Vec<Entry<'_>> = config
        .keys()
        .into_iter()
        .filter_map(|k| entry(config, k))
        .collect();
    if json {
        println!("{}", json_pretty(&entries)?);
    } else {
        for e in &entries {
            println!("{} = {}  ({})", e.key, e.value, e.source);
        }
    }
    Ok(EXIT_SUCCESS)
}
