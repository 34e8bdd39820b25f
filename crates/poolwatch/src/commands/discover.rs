//! `poolwatch discover` -- broadcast scan for gateways.

use std::time::Duration;

use tabled::{Table, Tabled, settings::Style};

use poolwatch_gateway::{BroadcastDiscovery, DiscoveredGateway};

use crate::cli::{DiscoverArgs, GlobalOpts};
use crate::error::CliError;

#[derive(Tabled)]
struct GatewayRow {
    #[tabled(rename = "DEVICE ID")]
    device_id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
    #[tabled(rename = "PORT")]
    port: u16,
    #[tabled(rename = "TYPE")]
    kind: String,
}

impl From<&DiscoveredGateway> for GatewayRow {
    fn from(gateway: &DiscoveredGateway) -> Self {
        Self {
            device_id: gateway.device_id.clone(),
            name: gateway.info.name.clone(),
            address: gateway.info.addr.to_string(),
            port: gateway.info.port,
            kind: format!("{}/{}", gateway.gateway_type, gateway.gateway_subtype),
        }
    }
}

pub async fn handle(args: DiscoverArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let discovery = BroadcastDiscovery::new(Duration::from_millis(args.timeout_ms));
    let found = discovery
        .discover()
        .await
        .map_err(|source| CliError::Discovery { source })?;

    if found.is_empty() {
        if !global.quiet {
            eprintln!("No gateways answered within {}ms", args.timeout_ms);
        }
        return Ok(());
    }

    let rows: Vec<GatewayRow> = found.iter().map(GatewayRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}
