//! `poolwatch resolve` -- connect info resolution with static fallback.

use owo_colors::OwoColorize;

use poolwatch_core::resolve_connect_info;
use poolwatch_gateway::BroadcastDiscovery;

use crate::cli::{GlobalOpts, ResolveArgs};
use crate::error::CliError;

pub async fn handle(args: ResolveArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(poolwatch_config::default_config_path);
    let settings = poolwatch_config::load(&path).map_err(|source| CliError::Config {
        path: path.display().to_string(),
        source,
    })?;

    let mut device = settings.device;
    if let Some(device_id) = args.device_id {
        device.device_id = device_id;
    }
    if device.device_id.is_empty() {
        return Err(CliError::NoDevice);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        device.discovery_timeout_ms = timeout_ms;
    }

    let config = device.into_device_config();
    let discovery = BroadcastDiscovery::new(config.discovery_timeout);

    let info = resolve_connect_info(&config, &discovery).await;
    let fresh = info != config.static_connect_info();

    if global.quiet {
        println!("{}:{}", info.addr, info.port);
        return Ok(());
    }

    let source = if fresh {
        "rediscovered".green().to_string()
    } else {
        "static fallback".yellow().to_string()
    };
    println!("{info} [{source}]");
    Ok(())
}
