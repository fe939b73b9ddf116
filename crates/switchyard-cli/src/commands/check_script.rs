use super::{json_pretty, EXIT_SUCCESS};
use std::sync::Arc;
use switchyard_config::ConfigurationView;
use switchyard_core::{RouteLoader, ScriptLoader, ScriptReference};
use switchyard_engine::TomlRouteEvaluator;

pub fn run(config: Arc<ConfigurationView>, reference: &str, json: bool) -> Result<u8, String> {
    let reference = ScriptReference::parse(reference).map_err(|e| e.to_string())?;
    let loader = ScriptLoader::new(reference, Arc::new(TomlRouteEvaluator::with_config(config)));
    let set = loader.load().map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&set.routes())?);
        return Ok(EXIT_SUCCESS);
    }

    println!("{}: {} route(s)", loader.reference(), set.len());
    for route in set.routes() {
        let mut line = format!("  {}", route.from);
        if !route.when.is_empty() {
            let filters: Vec<String> = route.when.iter().map(|(k, v)| format!("{k}={v}")).collect();
            line.push_str(&format!(" [{}]", filters.join(", ")));
        }
        if let Some(process) = &route.process {
            line.push_str(&format!(" => {process}"));
        }
        if !route.to.is_empty() {
            line.push_str(&format!(" -> {}", route.to.join(", ")));
        }
        println!("{line}");
    }
    Ok(EXIT_SUCCESS)
}
