use super::{json_pretty, EXIT_SUCCESS, EXIT_TIMEOUT};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use switchyard_config::{keys, ConfigurationView};
use switchyard_core::{install_signal_handler, prepare_filesystem, HomeLock, Host};
use tracing::{info, warn};

#[derive(Serialize)]
struct RunReport {
    replayed: usize,
    shutdown: &'static str,
}

pub fn run(
    config: Arc<ConfigurationView>,
    wait_timeout: Option<u64>,
    termination_timeout: u64,
    json: bool,
) -> Result<u8, String> {
    prepare_filesystem(&config).map_err(|e| e.to_string())?;
    let home = config
        .require(keys::HOME)
        .map(PathBuf::from)
        .map_err(|e| format!("configuration error: {e}"))?;
    let _lock = HomeLock::acquire_or_fail(&home).map_err(|e| e.to_string())?;

    let host = Host::assemble(config).map_err(|e| e.to_string())?;
    let replayed = host.launch().map_err(|e| e.to_string())?;
    let channel = host.channel();
    install_signal_handler(Arc::clone(channel));
    info!("switchyard running, {replayed} persisted script(s) replayed");
    if !json {
        println!("switchyard running ({replayed} persisted script(s) replayed)");
    }

    let shutdown = match wait_timeout {
        None => {
            channel.wait_shutdown().map_err(|e| e.to_string())?;
            "signal"
        }
        Some(secs) => {
            if channel
                .wait_shutdown_timeout(secs.saturating_mul(1000))
                .map_err(|e| e.to_string())?
            {
                "signal"
            } else {
                warn!("no termination signal within {secs}s, shutting down");
                let stopped = channel
                    .send_shutdown_signal_and_wait_timeout(termination_timeout.saturating_mul(1000))
                    .map_err(|e| e.to_string())?;
                if !stopped {
                    eprintln!("error: engine did not stop within {termination_timeout}s");
                    return Ok(EXIT_TIMEOUT);
                }
                "timeout"
            }
        }
    };

    if json {
        println!("{}", json_pretty(&RunReport { replayed, shutdown })?);
    } else {
        println!("switchyard stopped ({shutdown})");
    }
    Ok(EXIT_SUCCESS)
}
