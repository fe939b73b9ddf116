use super::{json_pretty, EXIT_SUCCESS};
use switchyard_config::ConfigurationView;
use switchyard_core::launcher::persisted_scripts;

pub fn run(config: &ConfigurationView, json: bool) -> Result<u8, String> {
    let scripts = persisted_scripts(config).map_err(|e| e.to_string())?;
    if json {
        let paths: Vec<String> = scripts
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        println!("{}", json_pretty(&paths)?);
    } else if scripts.is_empty() {
        println!("no persisted scripts found");
    } else {
        for path in &scripts {
            println!("{}", path.display());
        }
    }
    Ok(EXIT_SUCCESS)
}
